//! Lane packing for the intervals of one leaf row.
//!
//! # Algorithm
//!
//! Greedy interval-graph colouring:
//! 1. Sort intervals by `(start, id)`.
//! 2. Keep the end time of every level.
//! 3. Put each interval on the lowest-indexed level whose end is at or
//!    before its start; open a new level if none qualifies.
//!
//! Intervals are half-open: an interval ending exactly when another starts
//! does not overlap it, so both may share a level.
//!
//! The level count equals the maximum number of intervals overlapping at any
//! instant. The assignment is deterministic for a fixed interval set, which
//! keeps lanes stable across reloads.
//!
//! # Complexity
//! O(n log n): one sort plus two binary heaps (busy levels by end time,
//! free level indices).
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Problem 16-1
//! (interval-graph colouring)

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::models::{Interval, IntervalId, TimeSpan, Timestamp};

/// Default height of one level (px).
pub const DEFAULT_LEVEL_HEIGHT_PX: f64 = 24.0;

/// Level assignment of one leaf row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packing {
    levels: HashMap<IntervalId, usize>,
    level_count: usize,
}

impl Packing {
    /// Level of an interval, if it was packed.
    pub fn level_of(&self, id: IntervalId) -> Option<usize> {
        self.levels.get(&id).copied()
    }

    /// Number of levels used.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Number of packed intervals.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Vertical offset of an interval inside its row.
    pub fn offset_px(&self, id: IntervalId, level_height: f64) -> Option<f64> {
        self.level_of(id).map(|level| level as f64 * level_height)
    }

    /// Row height. Empty rows keep one level so they stay visible.
    pub fn row_height_px(&self, level_height: f64) -> f64 {
        self.level_count.max(1) as f64 * level_height
    }
}

/// Packs intervals into levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalPacker;

impl IntervalPacker {
    /// Packs the intervals visible in `window`.
    ///
    /// Open-ended and overflowing intervals are clamped to the window;
    /// intervals outside it are skipped.
    pub fn pack<'a, I>(intervals: I, window: &TimeSpan) -> Packing
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut spans: Vec<(Timestamp, IntervalId, Timestamp)> = intervals
            .into_iter()
            .filter_map(|iv| iv.clamp_to(window).map(|s| (s.start, iv.id, s.stop)))
            .collect();
        spans.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut busy: BinaryHeap<Reverse<(Timestamp, usize)>> = BinaryHeap::new();
        let mut free: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
        let mut levels = HashMap::with_capacity(spans.len());
        let mut level_count = 0;

        for (start, id, stop) in spans {
            // Starts are non-decreasing: once a level is free it stays free.
            while let Some(&Reverse((end, level))) = busy.peek() {
                if end > start {
                    break;
                }
                busy.pop();
                free.push(Reverse(level));
            }

            let level = match free.pop() {
                Some(Reverse(level)) => level,
                None => {
                    level_count += 1;
                    level_count - 1
                }
            };
            levels.insert(id, level);
            busy.push(Reverse((stop, level)));
        }

        Packing {
            levels,
            level_count,
        }
    }
}
