//! Control configuration schema types with serde deserialization.
//!
//! Defines the type hierarchy for form control documents:
//! - `ControlEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `ControlDocument`: full document with kind-specific options
//! - `DecisionTreeOptions`: decision graph for a computed field
//! - `EventSchedulerOptions`: offset-based event templates owned by one group
//!
//! Option types mirror the JSON shape of the form schema: camelCase keys,
//! unknown keys rejected.

mod decision_tree;
mod document;
mod envelope;
mod kind;
mod metadata;
mod scheduler;

pub use decision_tree::*;
pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;
pub use scheduler::*;

#[cfg(test)]
mod tests;
