//! [`EventList`]: the record's shared events array.

use careform_core::EncounterEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Owned view of the shared events array.
///
/// Several schedulers write into the same array, one group each. The only
/// mutation offered is [`replace_group`](EventList::replace_group), so a
/// scheduler can never append to or splice another group's events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventList {
    events: Vec<EncounterEvent>,
}

impl EventList {
    pub fn new(events: Vec<EncounterEvent>) -> Self {
        Self { events }
    }

    /// Read the events array from a record field. `null` is an empty list.
    pub fn from_json(value: &Value) -> serde_json::Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }

    /// Swap the whole slice owned by `group` for `slice`.
    ///
    /// Events of other groups (and untagged events) keep their relative order
    /// and come first; the new slice is appended in the given order, each
    /// event stamped with `group`.
    pub fn replace_group(&mut self, group: &str, slice: Vec<EncounterEvent>) {
        self.events.retain(|event| !event.belongs_to(group));
        self.events.extend(slice.into_iter().map(|mut event| {
            event.group = Some(group.to_string());
            event
        }));
    }

    /// Remove every event owned by `group`.
    pub fn clear_group(&mut self, group: &str) {
        self.replace_group(group, Vec::new());
    }

    /// Events currently owned by `group`, in list order.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a EncounterEvent> + 'a {
        self.events.iter().filter(move |event| event.belongs_to(group))
    }

    pub fn as_slice(&self) -> &[EncounterEvent] {
        &self.events
    }

    pub fn into_inner(self) -> Vec<EncounterEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<EncounterEvent>> for EventList {
    fn from(events: Vec<EncounterEvent>) -> Self {
        Self::new(events)
    }
}
