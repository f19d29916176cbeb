//! Control envelope for lightweight first-pass deserialization.

use serde::{Deserialize, Serialize};

use super::{Control, ControlDocument, ControlKind, ControlMetadata};

/// First-pass deserializer: header fields plus the raw `options` object.
///
/// Used during two-pass loading: first read `kind`, then deserialize
/// `options` into the kind-specific type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ControlMetadata,
    /// Raw options, deserialized in the second pass.
    pub options: serde_json::Value,
}

impl ControlEnvelope {
    /// Parse the `kind` field into a typed [`ControlKind`].
    pub fn control_kind(&self) -> std::result::Result<ControlKind, String> {
        self.kind.parse()
    }

    /// Second pass: deserialize `options` into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<ControlDocument, String> {
        let control = match self.control_kind()? {
            ControlKind::DecisionTree => Control::DecisionTree(
                serde_json::from_value(self.options.clone()).map_err(|e| e.to_string())?,
            ),
            ControlKind::EventScheduler => Control::EventScheduler(
                serde_json::from_value(self.options.clone()).map_err(|e| e.to_string())?,
            ),
        };
        Ok(ControlDocument {
            api_version: self.api_version.clone(),
            metadata: self.metadata.clone(),
            control,
        })
    }
}
