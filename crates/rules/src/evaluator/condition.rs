//! Single-condition matching against a resolved field value.

use careform_core::Scalar;

use crate::schema::Condition;

/// Evaluates one branch condition.
///
/// An absent field never matches, whatever the condition. `0`, `false` and
/// `""` are present values and compare like any other.
pub struct ConditionMatcher;

impl ConditionMatcher {
    pub fn matches(condition: &Condition, value: Option<&Scalar>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match condition {
            // Strict: no coercion between strings, numbers and booleans.
            Condition::EqualTo(expected) => expected == value,
            Condition::GreaterThan(threshold) => value.as_f64().is_some_and(|v| *threshold < v),
            Condition::LessThanOrEqualTo(threshold) => {
                value.as_f64().is_some_and(|v| v <= *threshold)
            }
        }
    }
}
