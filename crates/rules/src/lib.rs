//! Rule core for clinical data-entry forms.
//!
//! This crate provides:
//! - YAML/JSON control documents with serde deserialization
//! - Field resolution against the record and the patient document
//! - Decision tree evaluation with a cycle guard
//! - Group-scoped event scheduling (replace, never merge)
//! - Options validation with structured errors and suggestions
//! - Binding helpers: write-on-change controls and a debouncer
//! - A filesystem loader for control documents

pub mod binding;
pub mod evaluator;
pub mod loader;
pub mod resolver;
pub mod scheduler;
pub mod schema;
pub mod validation;
