//! Interval (record) model.
//!
//! An interval is one time-bounded record shown as a pill. Intervals are
//! owned by the record source: the engine reads them and proposes
//! mutations, it never deletes or edits them in place.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{server_datetime, TimeSpan, Timestamp};

/// Record identifier assigned by the record source.
pub type IntervalId = u64;

/// Value of one grouping dimension.
///
/// Records with an empty dimension field group under `Undefined`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum GroupKey {
    /// The record has no value for the dimension.
    Undefined,
    /// A concrete dimension value.
    Value(String),
}

impl GroupKey {
    /// Creates a concrete key.
    pub fn value(v: impl Into<String>) -> Self {
        Self::Value(v.into())
    }

    /// Display label.
    pub fn label(&self) -> &str {
        match self {
            Self::Undefined => "Undefined",
            Self::Value(v) => v,
        }
    }
}

impl From<Option<String>> for GroupKey {
    fn from(v: Option<String>) -> Self {
        v.map_or(Self::Undefined, Self::Value)
    }
}

impl From<GroupKey> for Option<String> {
    fn from(k: GroupKey) -> Self {
        match k {
            GroupKey::Undefined => None,
            GroupKey::Value(v) => Some(v),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(v: &str) -> Self {
        Self::Value(v.to_string())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A time-bounded record.
///
/// `stop == None` marks an open-ended interval; layout clamps it to the
/// visible window edge without touching the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Record identifier.
    pub id: IntervalId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Start instant.
    #[serde(with = "server_datetime")]
    pub start: Timestamp,
    /// Stop instant. `None` = open-ended.
    #[serde(with = "server_datetime::option", default)]
    pub stop: Option<Timestamp>,
    /// Consolidation measure (e.g. allocated hours).
    #[serde(default)]
    pub measure: Option<f64>,
    /// Never summed into group aggregates.
    #[serde(default)]
    pub exclude_from_consolidation: bool,
    /// One key per grouping dimension, in `group_by` order.
    #[serde(default)]
    pub group_keys: Vec<GroupKey>,
}

impl Interval {
    /// Creates a closed interval.
    pub fn new(id: IntervalId, start: Timestamp, stop: Timestamp) -> Self {
        Self {
            id,
            name: String::new(),
            start,
            stop: Some(stop),
            measure: None,
            exclude_from_consolidation: false,
            group_keys: Vec::new(),
        }
    }

    /// Creates an open-ended interval.
    pub fn open_ended(id: IntervalId, start: Timestamp) -> Self {
        Self {
            stop: None,
            ..Self::new(id, start, start)
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the consolidation measure.
    pub fn with_measure(mut self, measure: f64) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Excludes this interval from consolidation.
    pub fn excluded(mut self) -> Self {
        self.exclude_from_consolidation = true;
        self
    }

    /// Appends the key for the next grouping dimension.
    pub fn with_group_key(mut self, key: impl Into<GroupKey>) -> Self {
        self.group_keys.push(key.into());
        self
    }

    /// Whether the interval stops before it starts.
    pub fn is_malformed(&self) -> bool {
        self.stop.is_some_and(|stop| stop < self.start)
    }

    /// Group keys padded or truncated to `arity` dimensions.
    pub fn group_path(&self, arity: usize) -> Vec<GroupKey> {
        let mut keys: Vec<GroupKey> = self.group_keys.iter().take(arity).cloned().collect();
        keys.resize(arity, GroupKey::Undefined);
        keys
    }

    /// The part of this interval visible in `window`.
    ///
    /// Open-ended intervals extend to the window stop. Returns `None` when
    /// the interval lies outside the window. Zero-duration intervals are
    /// visible when their instant is inside the window.
    pub fn clamp_to(&self, window: &TimeSpan) -> Option<TimeSpan> {
        let stop = self.stop.unwrap_or(window.stop);
        if stop < self.start {
            return None;
        }
        if stop == self.start {
            return window
                .contains(self.start)
                .then(|| TimeSpan::new(self.start, self.start));
        }
        if self.start >= window.stop || stop <= window.start {
            return None;
        }
        Some(TimeSpan::new(
            self.start.max(window.start),
            stop.min(window.stop),
        ))
    }
}
