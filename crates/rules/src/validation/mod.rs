//! Control configuration validation with structured errors and suggestions.
//!
//! Runs before any control is evaluated: shape errors from deserialization,
//! decision tree structure (missing nodes, roots, circular dependencies),
//! scheduler options, and cross-control checks such as two schedulers
//! claiming the same event group.
//! Returns a [`ValidationResult`] with errors (block use) and warnings (advisory).
//!
//! The evaluators never call into this module.

mod control_checks;
mod scheduler_checks;
mod tree_checks;

pub mod fuzzy;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::*;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"tree.nodes.start.branches[0].node"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion,
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Merge another result, prefixing its paths.
    pub(crate) fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        let join = |path: String| {
            if path.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{path}")
            }
        };
        self.valid &= other.valid;
        self.errors.extend(other.errors.into_iter().map(|e| ValidationError {
            path: join(e.path),
            ..e
        }));
        self.warnings.extend(other.warnings.into_iter().map(|w| ValidationWarning {
            path: join(w.path),
            ..w
        }));
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate parsed decision tree options.
pub fn validate_decision_tree(options: &DecisionTreeOptions) -> ValidationResult {
    let mut result = ValidationResult::new();
    tree_checks::validate_tree(&options.tree, &mut result);
    result
}

/// Validate parsed event scheduler options.
pub fn validate_event_scheduler(options: &EventSchedulerOptions) -> ValidationResult {
    let mut result = ValidationResult::new();
    scheduler_checks::validate_scheduler(options, &mut result);
    result
}

/// Validate a single control document: header plus kind-specific options.
pub fn validate_document(doc: &ControlDocument) -> ValidationResult {
    let mut result = ValidationResult::new();
    control_checks::validate_header(doc, &mut result);
    let options = match &doc.control {
        Control::DecisionTree(options) => validate_decision_tree(options),
        Control::EventScheduler(options) => validate_event_scheduler(options),
    };
    result.absorb("options", options);
    result
}

/// Validate a set of controls that share one form, including cross-control
/// checks (duplicate ids, event groups claimed by more than one scheduler).
pub fn validate_controls(docs: &[ControlDocument]) -> ValidationResult {
    let mut result = ValidationResult::new();
    for doc in docs {
        result.absorb(&format!("controls.{}", doc.id()), validate_document(doc));
    }
    control_checks::validate_unique_ids(docs, &mut result);
    control_checks::validate_unique_groups(docs, &mut result);
    result
}

/// Parse raw JSON options of the given kind and validate them.
/// Deserialization errors are reported as validation errors.
pub fn validate_options_json(kind: ControlKind, options: &Value) -> ValidationResult {
    match kind {
        ControlKind::DecisionTree => {
            match serde_json::from_value::<DecisionTreeOptions>(options.clone()) {
                Ok(parsed) => validate_decision_tree(&parsed),
                Err(e) => parse_failure(e),
            }
        }
        ControlKind::EventScheduler => {
            match serde_json::from_value::<EventSchedulerOptions>(options.clone()) {
                Ok(parsed) => validate_event_scheduler(&parsed),
                Err(e) => parse_failure(e),
            }
        }
    }
}

fn parse_failure(e: serde_json::Error) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.error("", format!("Options parse error: {e}"));
    result
}
