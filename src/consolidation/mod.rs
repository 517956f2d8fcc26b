//! Group row aggregation ("consolidation").
//!
//! # Algorithm
//!
//! Sweep line over interval boundaries:
//! 1. Clamp every contributing interval to the window and emit a `+measure`
//!    event at its start and a `-measure` event at its stop.
//! 2. Sort events by instant and apply all events sharing an instant.
//! 3. Between two consecutive event instants the active set is constant,
//!    which yields one segment.
//!
//! Segments tile the span from the first boundary to the last one; gaps
//! where nothing is active come out as segments with `active_count == 0`.
//!
//! A group row always aggregates the *leaf* intervals beneath it, never the
//! aggregates of intermediate groups, so an interval is counted once.
//!
//! # Complexity
//! O(n log n) for n intervals.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::{AggregateSegment, Interval, SegmentColor, TimeSpan, Timestamp};

/// Default number of shading steps when no maximum applies.
pub const DEFAULT_SHADE_STEPS: u8 = 5;

fn default_shade_steps() -> u8 {
    DEFAULT_SHADE_STEPS
}

/// Consolidation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// Record field holding the measure, passed to the record source in
    /// every fetch query.
    pub measure_field: String,
    /// Maximum per grouping dimension (field name → max).
    #[serde(default)]
    pub max_by_dimension: HashMap<String, f64>,
    /// Boolean record field excluding a record from consolidation, passed
    /// to the record source like `measure_field`.
    #[serde(default)]
    pub exclude_field: Option<String>,
    /// Shading steps used when no maximum applies.
    #[serde(default = "default_shade_steps")]
    pub shade_steps: u8,
}

impl ConsolidationConfig {
    pub fn new(measure_field: impl Into<String>) -> Self {
        Self {
            measure_field: measure_field.into(),
            max_by_dimension: HashMap::new(),
            exclude_field: None,
            shade_steps: DEFAULT_SHADE_STEPS,
        }
    }

    /// Sets the maximum for a dimension.
    pub fn with_max(mut self, dimension: impl Into<String>, max: f64) -> Self {
        self.max_by_dimension.insert(dimension.into(), max);
        self
    }

    pub fn with_exclude_field(mut self, field: impl Into<String>) -> Self {
        self.exclude_field = Some(field.into());
        self
    }

    pub fn with_shade_steps(mut self, steps: u8) -> Self {
        self.shade_steps = steps;
        self
    }
}

/// What a segment value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMode {
    /// Number of active intervals.
    Count,
    /// Sum of the active intervals' measures.
    Measure,
}

/// Computes aggregate segments for one group row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Consolidator {
    mode: AggregateMode,
    max: Option<f64>,
    shade_steps: u8,
}

impl Consolidator {
    /// Counts active intervals.
    pub fn count() -> Self {
        Self {
            mode: AggregateMode::Count,
            max: None,
            shade_steps: DEFAULT_SHADE_STEPS,
        }
    }

    /// Sums measures.
    pub fn measure() -> Self {
        Self {
            mode: AggregateMode::Measure,
            ..Self::count()
        }
    }

    /// Consolidator for a group row whose top-level dimension is
    /// `top_dimension`. Without consolidation settings it counts.
    pub fn for_row(config: Option<&ConsolidationConfig>, top_dimension: Option<&str>) -> Self {
        match config {
            None => Self::count(),
            Some(cfg) => Self::measure()
                .with_max(top_dimension.and_then(|d| cfg.max_by_dimension.get(d).copied()))
                .with_shade_steps(cfg.shade_steps),
        }
    }

    pub fn with_max(mut self, max: Option<f64>) -> Self {
        self.max = max;
        self
    }

    pub fn with_shade_steps(mut self, steps: u8) -> Self {
        self.shade_steps = steps.max(1);
        self
    }

    #[inline]
    pub fn mode(&self) -> AggregateMode {
        self.mode
    }

    #[inline]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Sweeps `intervals` over `window`.
    ///
    /// Intervals flagged `exclude_from_consolidation` are ignored, as are
    /// duplicates (same id reached through several rows).
    pub fn consolidate<'a, I>(&self, intervals: I, window: &TimeSpan) -> Vec<AggregateSegment>
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut seen = HashSet::new();
        let mut events: Vec<(Timestamp, f64, i64)> = Vec::new();
        for iv in intervals {
            if iv.exclude_from_consolidation || !seen.insert(iv.id) {
                continue;
            }
            let Some(span) = iv.clamp_to(window) else {
                continue;
            };
            if span.stop <= span.start {
                continue;
            }
            let weight = match self.mode {
                AggregateMode::Count => 1.0,
                AggregateMode::Measure => iv.measure.unwrap_or(0.0),
            };
            events.push((span.start, weight, 1));
            events.push((span.stop, -weight, -1));
        }
        events.sort_by(|a, b| a.0.cmp(&b.0));

        let mut segments = Vec::new();
        let mut value = 0.0;
        let mut active: i64 = 0;
        let mut i = 0;
        while i < events.len() {
            let t = events[i].0;
            while i < events.len() && events[i].0 == t {
                value += events[i].1;
                active += events[i].2;
                i += 1;
            }
            if active == 0 {
                // Drop float residue once nothing is active.
                value = 0.0;
            }
            if let Some(&(next, _, _)) = events.get(i) {
                segments.push(self.segment(t, next, value, active as usize));
            }
        }
        segments
    }

    fn segment(
        &self,
        start: Timestamp,
        stop: Timestamp,
        value: f64,
        active: usize,
    ) -> AggregateSegment {
        let is_over_max = self.max.is_some_and(|max| value > max);
        let color = match self.max {
            Some(_) if is_over_max => SegmentColor::Danger,
            Some(_) => SegmentColor::Success,
            None => {
                let step = active.min(usize::from(self.shade_steps));
                SegmentColor::Shade(step as u8)
            }
        };
        AggregateSegment {
            start,
            stop,
            value,
            active_count: active,
            is_over_max,
            color,
        }
    }
}
