use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A future-dated event attached to an encounter record.
///
/// Events live in the record's `events` array. They are never edited in place:
/// the scheduler that owns a `group` replaces its whole slice on every recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterEvent {
    pub active_datetime: DateTime<Utc>,
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl EncounterEvent {
    /// Whether this event is owned by the given group tag.
    pub fn belongs_to(&self, group: &str) -> bool {
        self.group.as_deref() == Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_camel_case_and_skips_empty_options() {
        let event = EncounterEvent {
            active_datetime: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            document_type: "Appointment".to_string(),
            document_name: None,
            group: Some("G".to_string()),
            name: None,
            event_type: "reminder".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "activeDatetime": "2024-01-03T00:00:00Z",
                "documentType": "Appointment",
                "group": "G",
                "type": "reminder",
            })
        );
    }

    #[test]
    fn belongs_to_requires_exact_group() {
        let event: EncounterEvent = serde_json::from_str(
            r#"{"activeDatetime":"2024-01-01T00:00:00Z","documentType":"A","type":"t"}"#,
        )
        .unwrap();
        assert!(!event.belongs_to("G"));
        assert!(event.group.is_none());
    }
}
