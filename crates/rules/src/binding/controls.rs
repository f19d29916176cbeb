//! Controls bound to a record: recompute, compare, write on change.

use careform_core::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::evaluator::DecisionTreeEvaluator;
use crate::resolver::{FieldResolver, NULL};
use crate::scheduler::{EventList, EventScheduler};
use crate::schema::{Control, ControlDocument, DecisionTreeOptions};

use super::FieldSink;

// ── DecisionTreeControl ─────────────────────────────────────────────

/// Computed field backed by a decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTreeControl {
    options: DecisionTreeOptions,
    path: String,
}

impl DecisionTreeControl {
    pub fn new(options: DecisionTreeOptions, path: impl Into<String>) -> Self {
        Self {
            options,
            path: path.into(),
        }
    }

    /// Record field the outcome is written to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Evaluate the tree and write the outcome (or `null`) to [`path`](Self::path).
    ///
    /// Returns `Ok(true)` when a write happened. Nothing is written while the
    /// patient document is not loaded, or when the record already holds the
    /// computed value.
    pub fn recompute(
        &self,
        record: &Value,
        patient: Option<&Value>,
        sink: &mut impl FieldSink,
    ) -> Result<bool> {
        let Some(patient) = patient else {
            debug!(path = %self.path, "patient document not loaded, evaluation deferred");
            return Ok(false);
        };

        let next = DecisionTreeEvaluator::evaluate_options(&self.options, record, patient)
            .map(Value::String)
            .unwrap_or(Value::Null);
        let current = FieldResolver::lookup(record, &self.path).unwrap_or(&NULL);
        if *current == next {
            return Ok(false);
        }

        sink.set_field(&self.path, next.clone())?;
        debug!(path = %self.path, value = %next, "computed field updated");
        Ok(true)
    }
}

// ── EventSchedulerControl ───────────────────────────────────────────

/// Scheduler bound to the record's shared events array.
#[derive(Debug, Clone)]
pub struct EventSchedulerControl {
    scheduler: EventScheduler,
}

impl EventSchedulerControl {
    pub fn new(scheduler: EventScheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// Recompute this control's group and write the events array back when the
    /// group's slice changed.
    pub fn recompute(
        &self,
        record: &Value,
        now: DateTime<Utc>,
        sink: &mut impl FieldSink,
    ) -> Result<bool> {
        let field = &self.scheduler.options().events_field;
        let current = FieldResolver::lookup(record, field).unwrap_or(&NULL);
        let existing = match EventList::from_json(current) {
            Ok(list) => list,
            Err(e) => {
                warn!(
                    group = %self.scheduler.group(),
                    field = %field,
                    error = %e,
                    "events field is not a valid events array, leaving it untouched"
                );
                return Ok(false);
            }
        };

        let group = self.scheduler.group();
        let next = EventList::new(self.scheduler.compute(record, existing.as_slice(), now));
        // Other groups only move position on a rewrite; comparing the whole
        // array would make two schedulers rewrite each other forever.
        if next.group(group).eq(existing.group(group)) {
            return Ok(false);
        }

        let count = next.group(group).count();
        sink.set_field(field, serde_json::to_value(&next)?)?;
        debug!(group = %group, events = count, "events rescheduled");
        Ok(true)
    }
}

// ── BoundControl ────────────────────────────────────────────────────

/// Any configured control, ready to be driven by record updates.
#[derive(Debug, Clone)]
pub enum BoundControl {
    DecisionTree(DecisionTreeControl),
    EventScheduler(EventSchedulerControl),
}

impl BoundControl {
    /// Bind a control document. Decision tree outcomes are written under the
    /// control's id.
    pub fn from_document(doc: &ControlDocument) -> Self {
        let control = match &doc.control {
            Control::DecisionTree(options) => {
                Self::DecisionTree(DecisionTreeControl::new(options.clone(), doc.id()))
            }
            Control::EventScheduler(options) => {
                Self::EventScheduler(EventSchedulerControl::new(EventScheduler::new(options.clone())))
            }
        };
        info!(control_id = %doc.id(), kind = %doc.kind(), "bound control");
        control
    }

    /// Record field this control writes to.
    pub fn target_field(&self) -> &str {
        match self {
            Self::DecisionTree(control) => control.path(),
            Self::EventScheduler(control) => &control.scheduler().options().events_field,
        }
    }

    pub fn recompute(
        &self,
        record: &Value,
        patient: Option<&Value>,
        now: DateTime<Utc>,
        sink: &mut impl FieldSink,
    ) -> Result<bool> {
        match self {
            Self::DecisionTree(control) => control.recompute(record, patient, sink),
            Self::EventScheduler(control) => control.recompute(record, now, sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EventSchedulerOptions, EventTemplate, Trigger};
    use chrono::TimeZone;
    use serde_json::json;

    /// Records every write instead of applying it.
    #[derive(Default)]
    struct Recorder {
        writes: Vec<(String, Value)>,
    }

    impl FieldSink for Recorder {
        fn set_field(&mut self, path: &str, value: Value) -> Result<()> {
            self.writes.push((path.to_string(), value));
            Ok(())
        }
    }

    fn stage_control() -> DecisionTreeControl {
        let options: DecisionTreeOptions = serde_json::from_value(json!({
            "tree": {
                "root": "start",
                "nodes": {
                    "start": {
                        "branches": [
                            { "dataField": "cd4", "lessThanOrEqualTo": 200, "value": "stage-4" },
                            { "patientField": "age", "greaterThan": 14, "value": "adult" }
                        ]
                    }
                }
            }
        }))
        .unwrap();
        DecisionTreeControl::new(options, "computed.stage")
    }

    fn follow_up_control() -> EventSchedulerControl {
        follow_up_control_writing_to("events")
    }

    fn follow_up_control_writing_to(events_field: &str) -> EventSchedulerControl {
        EventSchedulerControl::new(EventScheduler::new(EventSchedulerOptions {
            group: "follow-up".into(),
            datetime_field: "visitDate".into(),
            trigger: Trigger::Always,
            schedule_now: false,
            events_field: events_field.into(),
            events: vec![EventTemplate {
                offset_days: Some(14),
                offset_minutes: None,
                document_type: "Appointment".into(),
                document_name: None,
                name: Some("Follow-up visit".into()),
                event_type: "follow-up".into(),
            }],
        }))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn tree_control_defers_until_patient_loaded() {
        let mut sink = Recorder::default();
        let changed = stage_control()
            .recompute(&json!({ "cd4": 150 }), None, &mut sink)
            .unwrap();
        assert!(!changed);
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn tree_control_writes_only_on_change() {
        let control = stage_control();
        let patient = json!({ "age": 30 });
        let mut sink = Recorder::default();

        assert!(control.recompute(&json!({ "cd4": 150 }), Some(&patient), &mut sink).unwrap());
        assert_eq!(sink.writes, vec![("computed.stage".to_string(), json!("stage-4"))]);

        let unchanged = json!({ "cd4": 150, "computed": { "stage": "stage-4" } });
        assert!(!control.recompute(&unchanged, Some(&patient), &mut sink).unwrap());
        assert_eq!(sink.writes.len(), 1);
    }

    #[test]
    fn tree_control_clears_to_null_when_nothing_matches() {
        let control = stage_control();
        let mut record = json!({ "cd4": 500, "computed": { "stage": "stage-4" } });
        let patient = json!({ "age": 9 });

        let snapshot = record.clone();
        assert!(control.recompute(&snapshot, Some(&patient), &mut record).unwrap());
        assert_eq!(record["computed"]["stage"], Value::Null);

        // A stored null equals the computed null.
        let snapshot = record.clone();
        assert!(!control.recompute(&snapshot, Some(&patient), &mut record).unwrap());
    }

    #[test]
    fn scheduler_control_writes_then_settles() {
        let control = follow_up_control();
        let mut record = json!({ "visitDate": "2024-03-01", "events": [] });

        let snapshot = record.clone();
        assert!(control.recompute(&snapshot, now(), &mut record).unwrap());
        assert_eq!(record["events"][0]["activeDatetime"], json!("2024-03-15T00:00:00Z"));
        assert_eq!(record["events"][0]["group"], json!("follow-up"));

        let snapshot = record.clone();
        assert!(!control.recompute(&snapshot, now(), &mut record).unwrap());
    }

    #[test]
    fn scheduler_control_ignores_position_of_other_groups() {
        let control = follow_up_control();
        let mut record = json!({ "visitDate": "2024-03-01", "events": [] });
        let snapshot = record.clone();
        control.recompute(&snapshot, now(), &mut record).unwrap();

        // Another scheduler appended its slice after ours.
        record["events"].as_array_mut().unwrap().push(json!({
            "activeDatetime": "2024-03-29T00:00:00Z",
            "documentType": "ARVRefill",
            "group": "arv-refill",
            "type": "reminder"
        }));

        let mut sink = Recorder::default();
        assert!(!control.recompute(&record, now(), &mut sink).unwrap());
        assert!(sink.writes.is_empty());
    }

    /// Recompute until the control stops writing; returns the number of writes.
    fn settle(control: &EventSchedulerControl, record: &mut Value) -> usize {
        let mut writes = 0;
        for _ in 0..3 {
            let snapshot = record.clone();
            if control.recompute(&snapshot, now(), record).unwrap() {
                writes += 1;
            }
        }
        writes
    }

    #[test]
    fn scheduler_control_settles_on_nested_events_field() {
        let control = follow_up_control_writing_to("encounter.events");
        let mut record = json!({ "visitDate": "2024-03-01" });

        assert_eq!(settle(&control, &mut record), 1);
        let events = FieldResolver::lookup(&record, "encounter.events").unwrap();
        assert_eq!(events[0]["group"], json!("follow-up"));
        assert_eq!(events[0]["activeDatetime"], json!("2024-03-15T00:00:00Z"));
    }

    #[test]
    fn scheduler_control_settles_on_indexed_events_field() {
        for field in ["visits[0].events", "visits.0.events"] {
            let control = follow_up_control_writing_to(field);
            let mut record = json!({ "visitDate": "2024-03-01", "visits": [{ "events": [] }] });

            assert_eq!(settle(&control, &mut record), 1, "{field}");
            assert_eq!(record["visits"][0]["events"][0]["group"], json!("follow-up"));
            assert_eq!(record.as_object().unwrap().len(), 2, "{field}: {record}");
        }
    }

    #[test]
    fn scheduler_control_rejects_out_of_range_events_field() {
        let control = follow_up_control_writing_to("visits[2].events");
        let mut record = json!({ "visitDate": "2024-03-01", "visits": [] });
        let snapshot = record.clone();
        assert!(control.recompute(&snapshot, now(), &mut record).is_err());
        assert_eq!(record, snapshot);
    }

    #[test]
    fn tree_control_settles_on_indexed_path() {
        let options = stage_control().options;
        let control = DecisionTreeControl::new(options, "visits[0].stage");
        let patient = json!({ "age": 30 });
        let mut record = json!({ "cd4": 150, "visits": [{}] });

        let snapshot = record.clone();
        assert!(control.recompute(&snapshot, Some(&patient), &mut record).unwrap());
        assert_eq!(FieldResolver::lookup(&record, "visits[0].stage"), Some(&json!("stage-4")));

        let snapshot = record.clone();
        assert!(!control.recompute(&snapshot, Some(&patient), &mut record).unwrap());
    }

    #[test]
    fn scheduler_control_defers_without_base_datetime() {
        let control = follow_up_control();
        let mut sink = Recorder::default();
        assert!(!control.recompute(&json!({}), now(), &mut sink).unwrap());
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn scheduler_control_leaves_malformed_events_alone() {
        let control = follow_up_control();
        let mut sink = Recorder::default();
        let record = json!({ "visitDate": "2024-03-01", "events": "not a list" });
        assert!(!control.recompute(&record, now(), &mut sink).unwrap());
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn bound_tree_control_targets_its_id() {
        let envelope: crate::schema::ControlEnvelope = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "DecisionTree",
            "metadata": { "id": "risk-level", "name": "Risk level" },
            "options": { "tree": { "root": "r", "nodes": { "r": { "value": "low" } } } }
        }))
        .unwrap();
        let bound = BoundControl::from_document(&envelope.parse_full().unwrap());
        assert_eq!(bound.target_field(), "risk-level");

        let mut record = json!({});
        let snapshot = record.clone();
        assert!(bound.recompute(&snapshot, Some(&json!({})), now(), &mut record).unwrap());
        assert_eq!(record, json!({ "risk-level": "low" }));
    }
}
