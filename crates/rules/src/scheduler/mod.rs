//! Group-scoped event scheduling.
//!
//! A scheduler control owns one `group` slice of the record's shared events
//! array. Every recompute rebuilds that slice from the control's templates and
//! swaps it in wholesale via [`EventList::replace_group`]; events owned by
//! other groups keep their relative order and are never touched.
//!
//! Scheduling is pure and idempotent: identical inputs always produce an
//! identical events array, so the caller can recompute on every data change.

mod core;
mod datetime;
mod list;
mod trigger;


pub use self::core::{reschedule, EventScheduler};
pub use self::datetime::parse_datetime;
pub use self::list::EventList;
