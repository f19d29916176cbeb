//! Control kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported control kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    DecisionTree,
    EventScheduler,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::DecisionTree => write!(f, "DecisionTree"),
            ControlKind::EventScheduler => write!(f, "EventScheduler"),
        }
    }
}

impl FromStr for ControlKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DecisionTree" => Ok(ControlKind::DecisionTree),
            "EventScheduler" => Ok(ControlKind::EventScheduler),
            other => Err(format!("unknown control kind: '{}'", other)),
        }
    }
}
