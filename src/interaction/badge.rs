//! Live resize badge ("+1 day", "-45 minutes").

use std::fmt;

use super::Edge;
use crate::scale::{Precision, TimeUnit};

/// Unit a badge is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeUnit {
    Month,
    Day,
    Hour,
    Minute,
}

impl BadgeUnit {
    fn label(self, plural: bool) -> &'static str {
        match (self, plural) {
            (Self::Month, false) => "month",
            (Self::Month, true) => "months",
            (Self::Day, false) => "day",
            (Self::Day, true) => "days",
            (Self::Hour, false) => "hour",
            (Self::Hour, true) => "hours",
            (Self::Minute, false) => "minute",
            (Self::Minute, true) => "minutes",
        }
    }
}

/// Signed edge delta shown while resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeBadge {
    pub edge: Edge,
    pub amount: i64,
    pub unit: BadgeUnit,
}

impl ResizeBadge {
    /// Badge for `steps` precision steps, in the largest unit that
    /// expresses the delta exactly.
    pub fn new(edge: Edge, steps: i64, precision: Precision) -> Self {
        let Some(step) = precision.step_duration() else {
            debug_assert_eq!(precision.unit, TimeUnit::Month);
            return Self {
                edge,
                amount: steps,
                unit: BadgeUnit::Month,
            };
        };
        let minutes = step.num_minutes() * steps;
        let (amount, unit) = if minutes % (24 * 60) == 0 {
            (minutes / (24 * 60), BadgeUnit::Day)
        } else if minutes % 60 == 0 {
            (minutes / 60, BadgeUnit::Hour)
        } else {
            (minutes, BadgeUnit::Minute)
        };
        Self { edge, amount, unit }
    }
}

impl fmt::Display for ResizeBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+} {}", self.amount, self.unit.label(self.amount.abs() != 1))
    }
}
