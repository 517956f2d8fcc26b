//! Time span model.
//!
//! # Time Model
//! All instants are UTC (`Timestamp`). Calendar boundaries (midnight,
//! month start) are computed in the session offset by the time scale and
//! converted back to UTC before they reach a span.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// A time interval [start, stop).
///
/// Half-open interval: includes start, excludes stop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeSpan {
    /// Interval start (inclusive).
    pub start: Timestamp,
    /// Interval stop (exclusive).
    pub stop: Timestamp,
}

impl TimeSpan {
    /// Creates a new span.
    pub fn new(start: Timestamp, stop: Timestamp) -> Self {
        Self { start, stop }
    }

    /// Duration of this span.
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.stop - self.start
    }

    /// Whether an instant falls within this span.
    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.start && t < self.stop
    }

    /// Whether two spans overlap.
    ///
    /// Touching spans (`a.stop == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    /// Intersection of two spans, if they overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let stop = self.stop.min(other.stop);
        if stop > start {
            Some(Self::new(start, stop))
        } else {
            None
        }
    }

    /// Overlap duration between two spans (zero when disjoint).
    pub fn overlap_duration(&self, other: &Self) -> TimeDelta {
        self.intersect(other)
            .map(|s| s.duration())
            .unwrap_or_else(TimeDelta::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(day: u32, hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2018, 12, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_time_span() {
        let s = TimeSpan::new(at(1, 0), at(2, 0));
        assert_eq!(s.duration(), TimeDelta::days(1));
        assert!(s.contains(at(1, 0)));
        assert!(s.contains(at(1, 23)));
        assert!(!s.contains(at(2, 0))); // exclusive stop
    }

    #[test]
    fn test_time_span_overlap() {
        let a = TimeSpan::new(at(1, 0), at(3, 0));
        let b = TimeSpan::new(at(2, 0), at(4, 0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert_eq!(a.overlap_duration(&b), TimeDelta::days(1));

        let c = TimeSpan::new(at(3, 0), at(5, 0)); // touching
        assert!(!a.overlaps(&c));
        assert_eq!(a.intersect(&c), None);
        assert_eq!(a.overlap_duration(&c), TimeDelta::zero());
    }
}
