//! Binding layer between the pure evaluators and a live form.
//!
//! Controls read the current record, compute, and write back through a
//! [`FieldSink`] only when the stored value actually changes. The
//! [`Debouncer`] coalesces bursts of record updates before a recompute.

mod controls;
mod debounce;
mod sink;

pub use controls::{BoundControl, DecisionTreeControl, EventSchedulerControl};
pub use debounce::Debouncer;
pub use sink::FieldSink;
