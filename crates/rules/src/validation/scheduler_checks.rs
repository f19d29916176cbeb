//! Event scheduler option checks.

use super::ValidationResult;

use crate::schema::{EventSchedulerOptions, Trigger};

pub(super) fn validate_scheduler(options: &EventSchedulerOptions, result: &mut ValidationResult) {
    if options.group.trim().is_empty() {
        result.error("group", "group must not be empty");
    }
    if options.datetime_field.trim().is_empty() {
        result.error("datetimeField", "datetimeField must not be empty");
    }
    if options.events_field.trim().is_empty() {
        result.error("eventsField", "eventsField must not be empty");
    }

    match &options.trigger {
        Trigger::Always => {}
        Trigger::Present { field } | Trigger::GreaterThan { field, .. } => {
            if field.trim().is_empty() {
                result.error("trigger.field", "trigger field must not be empty");
            }
        }
    }

    if options.events.is_empty() {
        result.warn(
            "events",
            "No event templates: the scheduler will only clear its group",
        );
    }

    for (i, template) in options.events.iter().enumerate() {
        let path = format!("events[{i}]");
        if template.document_type.trim().is_empty() {
            result.error(format!("{path}.documentType"), "documentType must not be empty");
        }
        if template.event_type.trim().is_empty() {
            result.error(format!("{path}.type"), "type must not be empty");
        }
        let negative = template.offset_days.is_some_and(|d| d < 0)
            || template.offset_minutes.is_some_and(|m| m < 0);
        if negative {
            result.warn(
                &path,
                "Negative offset schedules the event before its anchor datetime",
            );
        }
    }
}
