//! Filesystem control loader.
//!
//! Scans the controls directory for YAML and JSON control documents and
//! keeps the ones that parse and validate in an in-memory set keyed by id.
//! Uses two-pass deserialization (ControlEnvelope -> ControlDocument).

mod core;
mod error;


pub use self::core::{load_document, ControlLoader};
pub use self::error::{ControlError, LoadResult, LoadStatus, Result};
