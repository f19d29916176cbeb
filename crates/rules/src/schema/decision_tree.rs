//! Decision tree types: nodes, branches, conditions and field references.

use std::collections::BTreeMap;

use careform_core::Scalar;
use serde::{Deserialize, Serialize};

/// Identifier of a node within [`DecisionTree::nodes`].
pub type NodeId = String;

/// Options of a decision tree control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DecisionTreeOptions {
    /// Sub-object of the record that `dataField` paths are relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub tree: DecisionTree,
}

/// A graph of named nodes. Nodes may refer to each other by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DecisionTree {
    pub root: NodeId,
    pub nodes: BTreeMap<NodeId, DecisionNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DecisionNode {
    /// Outcome when the node has no branches or none of them matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Evaluated in order; the first matching branch is followed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<DecisionBranch>,
}

/// One conditional edge of the tree.
///
/// On the wire a branch is a flat object, e.g.
/// `{"dataField": "age", "greaterThan": 17, "node": "adult"}`. Exactly one field
/// reference and exactly one condition are required when parsing. Whether
/// `node` and `value` are mutually exclusive is checked by the validator, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawBranch", into = "RawBranch")]
pub struct DecisionBranch {
    pub condition: Condition,
    pub field: FieldRef,
    pub node: Option<NodeId>,
    pub value: Option<String>,
}

impl DecisionBranch {
    /// Branch that continues at another node when it matches.
    pub fn to_node(field: FieldRef, condition: Condition, node: impl Into<NodeId>) -> Self {
        Self {
            condition,
            field,
            node: Some(node.into()),
            value: None,
        }
    }

    /// Branch that terminates with a value when it matches.
    pub fn to_value(field: FieldRef, condition: Condition, value: impl Into<String>) -> Self {
        Self {
            condition,
            field,
            node: None,
            value: Some(value.into()),
        }
    }
}

/// Which document a branch reads its field from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// Path into the current record (relative to the control's base path).
    Data(String),
    /// Path into the patient document.
    Patient(String),
}

impl FieldRef {
    pub fn path(&self) -> &str {
        match self {
            FieldRef::Data(path) | FieldRef::Patient(path) => path,
        }
    }
}

/// The test a branch applies to its resolved field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    EqualTo(Scalar),
    GreaterThan(f64),
    LessThanOrEqualTo(f64),
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawBranch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equal_to: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    greater_than: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    less_than_or_equal_to: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl TryFrom<RawBranch> for DecisionBranch {
    type Error = String;

    fn try_from(raw: RawBranch) -> Result<Self, Self::Error> {
        let field = match (raw.data_field, raw.patient_field) {
            (Some(path), None) => FieldRef::Data(path),
            (None, Some(path)) => FieldRef::Patient(path),
            (Some(_), Some(_)) => {
                return Err("branch must set only one of `dataField` or `patientField`".to_string())
            }
            (None, None) => {
                return Err("branch must set one of `dataField` or `patientField`".to_string())
            }
        };

        let condition = match (raw.equal_to, raw.greater_than, raw.less_than_or_equal_to) {
            (Some(v), None, None) => Condition::EqualTo(v),
            (None, Some(v), None) => Condition::GreaterThan(v),
            (None, None, Some(v)) => Condition::LessThanOrEqualTo(v),
            _ => {
                return Err(
                    "branch must set exactly one of `equalTo`, `greaterThan` or `lessThanOrEqualTo`"
                        .to_string(),
                )
            }
        };

        Ok(DecisionBranch {
            condition,
            field,
            node: raw.node,
            value: raw.value,
        })
    }
}

impl From<DecisionBranch> for RawBranch {
    fn from(branch: DecisionBranch) -> Self {
        let (data_field, patient_field) = match branch.field {
            FieldRef::Data(path) => (Some(path), None),
            FieldRef::Patient(path) => (None, Some(path)),
        };
        let (equal_to, greater_than, less_than_or_equal_to) = match branch.condition {
            Condition::EqualTo(v) => (Some(v), None, None),
            Condition::GreaterThan(v) => (None, Some(v), None),
            Condition::LessThanOrEqualTo(v) => (None, None, Some(v)),
        };
        RawBranch {
            data_field,
            patient_field,
            equal_to,
            greater_than,
            less_than_or_equal_to,
            node: branch.node,
            value: branch.value,
        }
    }
}
