//! Header checks and cross-control checks for a form's set of controls.

use std::collections::HashMap;

use super::fuzzy::is_kebab_case;
use super::ValidationResult;

use crate::schema::ControlDocument;

pub(super) fn validate_header(doc: &ControlDocument, result: &mut ValidationResult) {
    if doc.api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", doc.api_version),
        );
    }
    if !is_kebab_case(doc.id()) {
        result.error(
            "metadata.id",
            format!(
                "id must be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                doc.id()
            ),
        );
    }
    if doc.metadata.name.trim().is_empty() {
        result.error("metadata.name", "name must not be empty");
    }
}

pub(super) fn validate_unique_ids(docs: &[ControlDocument], result: &mut ValidationResult) {
    let mut seen = HashMap::new();
    for (i, doc) in docs.iter().enumerate() {
        if let Some(first) = seen.insert(doc.id(), i) {
            result.error(
                format!("controls[{i}].metadata.id"),
                format!(
                    "Duplicate control id '{}' (first defined at controls[{first}])",
                    doc.id()
                ),
            );
        }
    }
}

/// Each event group may be owned by a single scheduler; two owners would
/// erase each other's slice on every recompute.
pub(super) fn validate_unique_groups(docs: &[ControlDocument], result: &mut ValidationResult) {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for doc in docs {
        let Some(options) = doc.as_event_scheduler() else {
            continue;
        };
        match owners.get(options.group.as_str()) {
            Some(owner) => result.error(
                format!("controls.{}.options.group", doc.id()),
                format!(
                    "Group '{}' is already owned by control '{}'",
                    options.group, owner
                ),
            ),
            None => {
                owners.insert(options.group.as_str(), doc.id());
            }
        }
    }
}
