//! Hierarchical rows.
//!
//! Rows are identified structurally by their [`RowPath`], the tuple of
//! dimension values from the root to the node. The open/closed state is
//! keyed by that path, so it survives reloads as long as the grouping path
//! still exists.

mod tree;

pub use tree::{NodeId, RowBand, RowKind, RowNode, RowTree};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{GroupKey, Interval};

/// Dimension values from the root to a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowPath(Vec<GroupKey>);

impl RowPath {
    pub fn new(keys: Vec<GroupKey>) -> Self {
        Self(keys)
    }

    /// The path of the single ungrouped row.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extends the path by one dimension value.
    pub fn child(&self, key: impl Into<GroupKey>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    /// Number of dimension values.
    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn keys(&self) -> &[GroupKey] {
        &self.0
    }

    /// Last dimension value.
    pub fn key(&self) -> Option<&GroupKey> {
        self.0.last()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// The first `depth` values.
    pub fn prefix(&self, depth: usize) -> Self {
        Self(self.0.iter().take(depth).cloned().collect())
    }

    pub fn starts_with(&self, other: &RowPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl From<Vec<GroupKey>> for RowPath {
    fn from(keys: Vec<GroupKey>) -> Self {
        Self(keys)
    }
}

impl<const N: usize> From<[&str; N]> for RowPath {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|&k| GroupKey::from(k)).collect())
    }
}

/// One group reported by the record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Group path, possibly shorter than the grouping arity.
    pub path: RowPath,
    /// Matching record count (may be zero).
    #[serde(default)]
    pub count: usize,
}

/// Grouping hierarchy reported alongside the records.
///
/// Includes groups with zero matching records. Entry order is the query's
/// ordering and drives row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStructure {
    entries: Vec<GroupEntry>,
}

impl GroupStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group.
    pub fn with_group(mut self, path: impl Into<RowPath>, count: usize) -> Self {
        self.entries.push(GroupEntry {
            path: path.into(),
            count,
        });
        self
    }

    /// Derives the leaf groups present in `records`, sorted by path.
    pub fn from_records(records: &[Interval], arity: usize) -> Self {
        let mut counts: BTreeMap<RowPath, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(RowPath::new(record.group_path(arity))).or_default() += 1;
        }
        Self {
            entries: counts
                .into_iter()
                .map(|(path, count)| GroupEntry { path, count })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persistent open/closed state of group rows.
///
/// Stores only deviations from the default, so toggling a row twice
/// restores the exact previous state. Only [`toggle`](Self::toggle),
/// [`expand_all`](Self::expand_all) and [`collapse_all`](Self::collapse_all)
/// mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenState {
    overrides: BTreeMap<RowPath, bool>,
    blanket: Option<bool>,
}

impl OpenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default state of a group row without an override.
    pub fn default_for(&self, path: &RowPath, collapse_first_level: bool) -> bool {
        match self.blanket {
            Some(open) => open,
            None => !(collapse_first_level && path.depth() == 1),
        }
    }

    pub fn is_open(&self, path: &RowPath, collapse_first_level: bool) -> bool {
        self.overrides
            .get(path)
            .copied()
            .unwrap_or_else(|| self.default_for(path, collapse_first_level))
    }

    /// Flips one row. Returns the new state.
    pub fn toggle(&mut self, path: &RowPath, collapse_first_level: bool) -> bool {
        let open = !self.is_open(path, collapse_first_level);
        if open == self.default_for(path, collapse_first_level) {
            self.overrides.remove(path);
        } else {
            self.overrides.insert(path.clone(), open);
        }
        open
    }

    pub fn expand_all(&mut self) {
        self.overrides.clear();
        self.blanket = Some(true);
    }

    pub fn collapse_all(&mut self) {
        self.overrides.clear();
        self.blanket = Some(false);
    }

    /// Paths explicitly set to closed.
    pub fn closed_paths(&self) -> impl Iterator<Item = &RowPath> {
        self.overrides
            .iter()
            .filter(|&(_, open)| !*open)
            .map(|(path, _)| path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_row_path() {
        let path = RowPath::from(["Alice", "Project A"]);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.parent(), Some(RowPath::from(["Alice"])));
        assert_eq!(path.prefix(1), RowPath::from(["Alice"]));
        assert!(path.starts_with(&RowPath::from(["Alice"])));
        assert_eq!(RowPath::root().child("Alice"), RowPath::from(["Alice"]));
        assert_eq!(RowPath::root().parent(), None);
        assert_eq!(path.key(), Some(&GroupKey::value("Project A")));
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let path = RowPath::from(["Alice"]);
        for collapse in [false, true] {
            let mut state = OpenState::new();
            state.toggle(&RowPath::from(["Bob"]), collapse);
            let before = state.clone();
            state.toggle(&path, collapse);
            assert_ne!(state, before);
            state.toggle(&path, collapse);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_collapse_first_level_default() {
        let state = OpenState::new();
        assert!(!state.is_open(&RowPath::from(["Alice"]), true));
        assert!(state.is_open(&RowPath::from(["Alice", "P"]), true));
        assert!(state.is_open(&RowPath::from(["Alice"]), false));
    }

    #[test]
    fn test_expand_collapse_all() {
        let mut state = OpenState::new();
        state.toggle(&RowPath::from(["Alice"]), false);
        assert_eq!(state.closed_paths().count(), 1);

        state.collapse_all();
        assert!(!state.is_open(&RowPath::from(["Bob", "P"]), false));
        state.expand_all();
        assert!(state.is_open(&RowPath::from(["Alice"]), true));
        assert_eq!(state.closed_paths().count(), 0);
    }

    #[test]
    fn test_structure_from_records() {
        let t = Utc.with_ymd_and_hms(2018, 12, 1, 0, 0, 0).unwrap();
        let records = vec![
            Interval::new(1, t, t).with_group_key("Bob"),
            Interval::new(2, t, t).with_group_key("Alice"),
            Interval::new(3, t, t).with_group_key("Bob"),
            Interval::new(4, t, t),
        ];
        let structure = GroupStructure::from_records(&records, 1);
        let entries = structure.entries();
        assert_eq!(entries.len(), 3);
        // Undefined sorts first
        assert_eq!(entries[0].path, RowPath::new(vec![GroupKey::Undefined]));
        assert_eq!(entries[1].path, RowPath::from(["Alice"]));
        assert_eq!(entries[2].count, 2);
    }
}
