//! [`reschedule`] and the [`EventScheduler`] control wrapper.

use careform_core::EncounterEvent;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::resolver::FieldResolver;
use crate::schema::{EventSchedulerOptions, EventTemplate};

use super::datetime::parse_datetime;
use super::list::EventList;

/// Compute the new events array for one group.
///
/// - `base` unavailable: scheduling is deferred and `existing` is returned unchanged.
/// - `triggered == false`: the group's slice is cleared.
/// - otherwise one event per template at `anchor + offsetDays + offsetMinutes`,
///   where the anchor is `now` when `schedule_now` is set and `base` otherwise.
///
/// Non-group events come first in their original order, followed by the new
/// slice in template order.
pub fn reschedule(
    existing: &[EncounterEvent],
    group: &str,
    templates: &[EventTemplate],
    base: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    schedule_now: bool,
    triggered: bool,
) -> Vec<EncounterEvent> {
    let Some(base) = base else {
        debug!(group = %group, "base datetime unavailable, scheduling deferred");
        return existing.to_vec();
    };

    let mut list = EventList::new(existing.to_vec());
    if !triggered {
        list.clear_group(group);
        return list.into_inner();
    }

    let anchor = if schedule_now { now } else { base };
    let slice = templates
        .iter()
        .filter_map(|template| instantiate(template, anchor, group))
        .collect();
    list.replace_group(group, slice);
    list.into_inner()
}

fn instantiate(
    template: &EventTemplate,
    anchor: DateTime<Utc>,
    group: &str,
) -> Option<EncounterEvent> {
    let active_datetime = template_offset(template).and_then(|offset| anchor.checked_add_signed(offset));
    let Some(active_datetime) = active_datetime else {
        warn!(
            group = %group,
            event_type = %template.event_type,
            offset_days = ?template.offset_days,
            offset_minutes = ?template.offset_minutes,
            "event offset out of range, template skipped"
        );
        return None;
    };

    Some(EncounterEvent {
        active_datetime,
        document_type: template.document_type.clone(),
        document_name: template.document_name.clone(),
        group: Some(group.to_string()),
        name: template.name.clone(),
        event_type: template.event_type.clone(),
    })
}

fn template_offset(template: &EventTemplate) -> Option<TimeDelta> {
    let days = TimeDelta::try_days(template.offset_days.unwrap_or(0))?;
    let minutes = TimeDelta::try_minutes(template.offset_minutes.unwrap_or(0))?;
    days.checked_add(&minutes)
}

// ── EventScheduler ──────────────────────────────────────────────────

/// A configured scheduler: reads its inputs from a record and reschedules.
///
/// Replaces the separate per-quantity scheduling controls with one type
/// parameterized by trigger, templates and group.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    options: EventSchedulerOptions,
}

impl EventScheduler {
    pub fn new(options: EventSchedulerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EventSchedulerOptions {
        &self.options
    }

    pub fn group(&self) -> &str {
        &self.options.group
    }

    /// The anchor datetime read from the record, if present and parseable.
    pub fn base_datetime(&self, record: &Value) -> Option<DateTime<Utc>> {
        FieldResolver::lookup(record, &self.options.datetime_field).and_then(parse_datetime)
    }

    /// Recompute this scheduler's slice of `existing` for the given record.
    pub fn compute(
        &self,
        record: &Value,
        existing: &[EncounterEvent],
        now: DateTime<Utc>,
    ) -> Vec<EncounterEvent> {
        reschedule(
            existing,
            &self.options.group,
            &self.options.events,
            self.base_datetime(record),
            now,
            self.options.schedule_now,
            self.options.trigger.holds(record),
        )
    }
}
