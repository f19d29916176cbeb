//! Control document container and accessors.

use super::{ControlEnvelope, ControlKind, ControlMetadata, DecisionTreeOptions, EventSchedulerOptions};

/// A fully deserialized control configuration of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlDocument {
    pub api_version: String,
    pub metadata: ControlMetadata,
    pub control: Control,
}

/// Kind-specific options of a control.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Computed field derived from a decision tree.
    DecisionTree(DecisionTreeOptions),
    /// Group-owned slice of the record's events.
    EventScheduler(EventSchedulerOptions),
}

impl ControlDocument {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn kind(&self) -> ControlKind {
        match self.control {
            Control::DecisionTree(_) => ControlKind::DecisionTree,
            Control::EventScheduler(_) => ControlKind::EventScheduler,
        }
    }

    pub fn as_decision_tree(&self) -> Option<&DecisionTreeOptions> {
        match &self.control {
            Control::DecisionTree(options) => Some(options),
            _ => None,
        }
    }

    pub fn as_event_scheduler(&self) -> Option<&EventSchedulerOptions> {
        match &self.control {
            Control::EventScheduler(options) => Some(options),
            _ => None,
        }
    }

    /// Convert back into the envelope shape used on disk.
    pub fn to_envelope(&self) -> serde_json::Result<ControlEnvelope> {
        let options = match &self.control {
            Control::DecisionTree(options) => serde_json::to_value(options)?,
            Control::EventScheduler(options) => serde_json::to_value(options)?,
        };
        Ok(ControlEnvelope {
            api_version: self.api_version.clone(),
            kind: self.kind().to_string(),
            metadata: self.metadata.clone(),
            options,
        })
    }

    /// Serialize this document to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        let envelope = self
            .to_envelope()
            .map_err(<serde_yaml::Error as serde::ser::Error>::custom)?;
        serde_yaml::to_string(&envelope)
    }
}
