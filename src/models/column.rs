//! Column model.

use serde::{Deserialize, Serialize};

use super::{TimeSpan, Timestamp};

/// One coarse column of the time grid (an hour, a day or a month).
///
/// Columns are contiguous and ordered; together they cover the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Position in the grid (0-based).
    pub index: usize,
    /// Column start (inclusive).
    pub start: Timestamp,
    /// Column stop (exclusive).
    pub stop: Timestamp,
    /// The current instant falls in this column.
    pub is_today: bool,
    /// Marked unavailable by the record source (weekend, off-hours).
    pub is_unavailable: bool,
}

impl Column {
    pub fn new(index: usize, start: Timestamp, stop: Timestamp) -> Self {
        Self {
            index,
            start,
            stop,
            is_today: false,
            is_unavailable: false,
        }
    }

    #[inline]
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.stop)
    }
}
