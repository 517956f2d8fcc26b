//! Aggregate segment model.
//!
//! Group rows display a piecewise-constant aggregate of their descendant
//! intervals. Each segment is a maximal sub-span over which the set of
//! active intervals does not change.

use serde::{Deserialize, Serialize};

use super::{TimeSpan, Timestamp};

/// Display colour class of an aggregate segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentColor {
    /// Value exceeds the configured maximum.
    Danger,
    /// A maximum applies and the value respects it.
    Success,
    /// No maximum applies: intensity step keyed by co-occurring intervals.
    Shade(u8),
}

/// One piece of a group row aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSegment {
    /// Segment start (inclusive).
    pub start: Timestamp,
    /// Segment stop (exclusive).
    pub stop: Timestamp,
    /// Summed measure (or interval count when no measure is configured).
    pub value: f64,
    /// Number of intervals active during the segment.
    pub active_count: usize,
    /// `value > max` for the row's dimension.
    pub is_over_max: bool,
    /// Colour class.
    pub color: SegmentColor,
}

impl AggregateSegment {
    #[inline]
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.stop)
    }

    /// Whether any interval is active (empty gaps are not drawn).
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active_count > 0
    }
}
