//! Event scheduler options: templates, trigger and group ownership.

use serde::{Deserialize, Serialize};

/// Options of an event scheduler control.
///
/// One control owns exactly one `group` slice of the record's events array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EventSchedulerOptions {
    /// Group tag stamped on every event this control schedules.
    pub group: String,
    /// Record field holding the base datetime the offsets are applied to.
    pub datetime_field: String,
    #[serde(default)]
    pub trigger: Trigger,
    /// Anchor offsets at the evaluation time instead of the base datetime.
    #[serde(default)]
    pub schedule_now: bool,
    /// Record field holding the shared events array.
    #[serde(default = "default_events_field")]
    pub events_field: String,
    #[serde(default)]
    pub events: Vec<EventTemplate>,
}

pub(crate) fn default_events_field() -> String {
    "events".to_string()
}

/// Blueprint for one scheduled event, relative to the anchor datetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EventTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_minutes: Option<i64>,
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
}

/// Condition on the record that decides whether the group's events exist at all.
///
/// When the trigger does not hold the group's slice is cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Trigger {
    /// Events are scheduled whenever the base datetime is available.
    #[default]
    Always,
    /// The field is present and not `false`, `0` or the empty string.
    Present { field: String },
    /// The field is a number strictly greater than `value`.
    GreaterThan { field: String, value: f64 },
}
