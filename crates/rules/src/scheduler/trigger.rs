//! Trigger evaluation against the current record.

use serde_json::Value;

use crate::evaluator::ConditionMatcher;
use crate::resolver::FieldResolver;
use crate::schema::{Condition, Trigger};

impl Trigger {
    /// Whether the scheduler's events should currently exist.
    pub fn holds(&self, record: &Value) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::Present { field } => {
                FieldResolver::resolve(record, field).is_some_and(|value| !value.is_blank())
            }
            Trigger::GreaterThan { field, value } => ConditionMatcher::matches(
                &Condition::GreaterThan(*value),
                FieldResolver::resolve(record, field).as_ref(),
            ),
        }
    }
}
