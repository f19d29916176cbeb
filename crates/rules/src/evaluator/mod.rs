//! Decision tree evaluation for computed form fields.
//!
//! The evaluator walks from the root node, following the first matching
//! branch of each node, until a branch yields a terminal value or no branch
//! matches (the node's own `value` is the outcome). Each node may be entered
//! at most once per evaluation; re-entering one is treated as a cycle and the
//! walk stops at the current node.
//!
//! Evaluation is pure: the tree is never mutated, nothing is cached between
//! calls and no error is ever returned to the caller.

mod condition;

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::resolver::{FieldResolver, NULL};
use crate::schema::{DecisionTree, DecisionTreeOptions};

pub use condition::ConditionMatcher;

// ── Decision tree evaluator ─────────────────────────────────────────

pub struct DecisionTreeEvaluator;

impl DecisionTreeEvaluator {
    /// Evaluate `tree` against the record data and the patient document.
    ///
    /// Returns `None` when the root is missing or the final node has no value.
    /// A matched branch pointing to a node that does not exist ends the walk
    /// at the current node, like a cycle does.
    pub fn evaluate(tree: &DecisionTree, data: &Value, patient: &Value) -> Option<String> {
        let mut current_id = tree.root.as_str();
        let mut current = tree.nodes.get(current_id)?;
        let mut visited: HashSet<&str> = HashSet::from([current_id]);

        'walk: loop {
            for branch in &current.branches {
                let field = FieldResolver::resolve_ref(&branch.field, data, patient);
                if !ConditionMatcher::matches(&branch.condition, field.as_ref()) {
                    continue;
                }

                if let Some(value) = &branch.value {
                    return Some(value.clone());
                }

                let Some(next_id) = branch.node.as_deref() else {
                    debug!(node = %current_id, "matched branch has neither node nor value, skipping");
                    continue;
                };

                if !visited.insert(next_id) {
                    warn!(
                        node = %current_id,
                        target = %next_id,
                        "invalid decision tree with circular node connections"
                    );
                    return current.value.clone();
                }

                let Some(next) = tree.nodes.get(next_id) else {
                    warn!(node = %current_id, target = %next_id, "decision tree branch targets a missing node");
                    return current.value.clone();
                };

                current_id = next_id;
                current = next;
                continue 'walk;
            }

            return current.value.clone();
        }
    }

    /// Evaluate a control's options against a full record.
    ///
    /// `dataField` paths are resolved relative to `base_path`. An empty or
    /// missing base path means the whole record; a base path that does not
    /// exist in the record behaves like an empty document.
    pub fn evaluate_options(
        options: &DecisionTreeOptions,
        record: &Value,
        patient: &Value,
    ) -> Option<String> {
        let data = match options.base_path.as_deref() {
            None | Some("") => record,
            Some(path) => FieldResolver::lookup(record, path).unwrap_or(&NULL),
        };
        Self::evaluate(&options.tree, data, patient)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
