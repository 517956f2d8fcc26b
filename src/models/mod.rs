//! Timeline grid data models.
//!
//! Plain data types exchanged between the engine components, the record
//! source and the renderer.
//!
//! # Domain Mappings
//!
//! | u-gantt | Planning | Project | Manufacturing |
//! |---------|----------|---------|---------------|
//! | Interval | Shift | Task | Work order |
//! | GroupKey | Employee | Project | Work center |
//! | AggregateSegment | Allocated hours | Load | Capacity use |

mod aggregate;
mod column;
mod interval;
mod mutation;
pub mod server_datetime;
mod span;

pub use aggregate::{AggregateSegment, SegmentColor};
pub use column::Column;
pub use interval::{GroupKey, Interval, IntervalId};
pub use mutation::{DateFields, FieldChanges, PendingMutation, PrefilledFields};
pub use span::TimeSpan;

/// UTC instant.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
