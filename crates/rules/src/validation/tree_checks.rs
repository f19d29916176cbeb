//! Decision tree structure checks: node shape, missing nodes, roots and cycles.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::schema::DecisionTree;

use super::fuzzy::fuzzy_match;
use super::ValidationResult;

pub(super) fn validate_tree(tree: &DecisionTree, result: &mut ValidationResult) {
    let node_ids: Vec<&str> = tree.nodes.keys().map(String::as_str).collect();

    let root_defined = tree.nodes.contains_key(&tree.root);
    if !root_defined {
        result.error_with_suggestion(
            "tree.root",
            format!("Root node '{}' is not defined in tree.nodes", tree.root),
            fuzzy_match(&tree.root, &node_ids).map(|s| format!("Did you mean '{s}'?")),
        );
    }

    let mut missing = BTreeSet::new();
    for (id, node) in &tree.nodes {
        let node_path = format!("tree.nodes.{id}");
        if node.value.is_none() && node.branches.is_empty() {
            result.error(&node_path, "Node must define a value or at least one branch");
        }

        for (i, branch) in node.branches.iter().enumerate() {
            let branch_path = format!("{node_path}.branches[{i}]");
            match (&branch.node, &branch.value) {
                (Some(_), Some(_)) => result.error(
                    &branch_path,
                    "Exactly one of 'node' or 'value' must be set, but both are present",
                ),
                (None, None) => result.error(
                    &branch_path,
                    "Exactly one of 'node' or 'value' must be set, but neither is present",
                ),
                _ => {}
            }

            if branch.field.path().is_empty() {
                result.error(format!("{branch_path}.field"), "Field path must not be empty");
            }

            if let Some(target) = &branch.node {
                if !tree.nodes.contains_key(target) {
                    missing.insert(target.as_str());
                    result.error_with_suggestion(
                        format!("{branch_path}.node"),
                        format!("Missing tree node '{target}'"),
                        fuzzy_match(target, &node_ids).map(|s| format!("Did you mean '{s}'?")),
                    );
                }
            }
        }
    }

    // Root and cycle analysis needs a closed graph.
    if root_defined && missing.is_empty() {
        validate_structure(tree, result);
    }
}

/// Single root equal to `tree.root`, and no circular dependencies.
fn validate_structure(tree: &DecisionTree, result: &mut ValidationResult) {
    let mut parents: BTreeMap<&str, BTreeSet<&str>> =
        tree.nodes.keys().map(|id| (id.as_str(), BTreeSet::new())).collect();
    for (id, node) in &tree.nodes {
        for target in node.branches.iter().filter_map(|b| b.node.as_deref()) {
            if let Some(set) = parents.get_mut(target) {
                set.insert(id.as_str());
            }
        }
    }

    let roots: Vec<&str> = parents
        .iter()
        .filter(|(_, p)| p.is_empty())
        .map(|(id, _)| *id)
        .collect();

    match roots.as_slice() {
        [] => {
            result.error("tree", "No tree root found (circular dependency to root?)");
            return;
        }
        [only] if *only != tree.root => {
            result.error(
                "tree.root",
                format!("Invalid root: '{}' but '{}' expected", only, tree.root),
            );
            return;
        }
        [_] => {}
        many => {
            result.error("tree", format!("Tree has multiple roots: {}", many.join(", ")));
            return;
        }
    }

    // Kahn's algorithm: whatever keeps a parent after the sort sits on a cycle.
    let mut remaining: BTreeMap<&str, usize> =
        parents.iter().map(|(id, p)| (*id, p.len())).collect();
    let mut queue: VecDeque<&str> = VecDeque::from([tree.root.as_str()]);
    while let Some(id) = queue.pop_front() {
        remaining.remove(id);
        let children: BTreeSet<&str> = tree.nodes[id]
            .branches
            .iter()
            .filter_map(|b| b.node.as_deref())
            .collect();
        for child in children {
            if let Some(count) = remaining.get_mut(child) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    if !remaining.is_empty() {
        let nodes: Vec<&str> = remaining.keys().copied().collect();
        result.error(
            "tree",
            format!("Circular dependency detected for node(s): {}", nodes.join(", ")),
        );
    }
}
