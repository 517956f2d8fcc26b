//! Row tree arena.
//!
//! # Construction
//! 1. Walk the group structure in query order and register every path and
//!    its prefixes. Leaf-depth paths become leaf rows even with no records.
//! 2. Records whose leaf path is missing from the structure get an empty
//!    row appended after the structured ones (the records are not shown).
//! 3. Group paths without any leaf below them are dropped.
//! 4. Records are attached to their leaf and sorted by `(start, id)`.
//!
//! The tree is rebuilt wholesale on every applied response; only the
//! [`OpenState`] is carried over.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::{GroupStructure, OpenState, RowPath};
use crate::consolidation::{ConsolidationConfig, Consolidator};
use crate::models::{AggregateSegment, GroupKey, Interval, IntervalId, TimeSpan};
use crate::packing::{IntervalPacker, Packing};

/// Index of a node in the arena.
pub type NodeId = usize;

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// Aggregating row.
    Group {
        aggregate: Vec<AggregateSegment>,
    },
    /// Interval-bearing row.
    Leaf {
        intervals: Vec<Interval>,
        packing: Packing,
        /// Per-row unavailability marks (column index → unavailable).
        unavailable: BTreeMap<usize, bool>,
    },
}

/// One row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowNode {
    /// Structural identity.
    pub path: RowPath,
    /// Dimension field this row groups on (`None` for the ungrouped row).
    pub field: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Open state (always `true` for leaves).
    pub is_open: bool,
    pub kind: RowKind,
}

impl RowNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, RowKind::Leaf { .. })
    }

    /// Row label.
    pub fn label(&self) -> &str {
        self.path.key().map_or("", GroupKey::label)
    }

    /// Intervals of a leaf row (empty for group rows).
    pub fn intervals(&self) -> &[Interval] {
        match &self.kind {
            RowKind::Leaf { intervals, .. } => intervals,
            RowKind::Group { .. } => &[],
        }
    }

    pub fn packing(&self) -> Option<&Packing> {
        match &self.kind {
            RowKind::Leaf { packing, .. } => Some(packing),
            RowKind::Group { .. } => None,
        }
    }

    /// Aggregate segments of a group row (empty for leaves).
    pub fn aggregate(&self) -> &[AggregateSegment] {
        match &self.kind {
            RowKind::Group { aggregate } => aggregate,
            RowKind::Leaf { .. } => &[],
        }
    }

    /// Whether the column is unavailable for this row.
    pub fn is_unavailable(&self, column: usize) -> bool {
        match &self.kind {
            RowKind::Leaf { unavailable, .. } => unavailable.get(&column).copied().unwrap_or(false),
            RowKind::Group { .. } => false,
        }
    }
}

/// Vertical extent of a visible row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBand {
    pub node: NodeId,
    pub path: RowPath,
    /// Offset from the top of the grid body (px).
    pub top: f64,
    /// Row height (px).
    pub height: f64,
    pub is_leaf: bool,
}

impl RowBand {
    pub fn contains(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

/// Hierarchical rows of one view cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTree {
    nodes: Vec<RowNode>,
    roots: Vec<NodeId>,
    index: HashMap<RowPath, NodeId>,
    placement: HashMap<IntervalId, NodeId>,
    group_fields: Vec<String>,
    open_state: OpenState,
    collapse_first_level: bool,
}

impl RowTree {
    /// Builds the rows for `records`.
    ///
    /// `open_state` is read, never altered, so a rebuild cannot change the
    /// persisted state. Paths it mentions that no longer exist are inert.
    pub fn build(
        records: &[Interval],
        group_fields: &[String],
        structure: &GroupStructure,
        open_state: OpenState,
        collapse_first_level: bool,
    ) -> Self {
        let arity = group_fields.len();
        let mut tree = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            index: HashMap::new(),
            placement: HashMap::new(),
            group_fields: group_fields.to_vec(),
            open_state,
            collapse_first_level,
        };

        let mut order: Vec<RowPath> = Vec::new();
        let mut seen: HashSet<RowPath> = HashSet::new();
        let mut register = |path: &RowPath, order: &mut Vec<RowPath>| {
            for depth in 1..=path.depth() {
                let prefix = path.prefix(depth);
                if seen.insert(prefix.clone()) {
                    order.push(prefix);
                }
            }
        };

        // Leaf paths reported by the structure; only these receive records.
        let mut structured: HashSet<RowPath> = HashSet::new();
        let mut leaves: HashSet<RowPath> = HashSet::new();
        if arity == 0 {
            order.push(RowPath::root());
            structured.insert(RowPath::root());
        } else {
            for entry in structure.entries() {
                let path = entry.path.prefix(arity);
                if path.depth() == 0 {
                    continue;
                }
                register(&path, &mut order);
                if path.depth() == arity {
                    structured.insert(path);
                }
            }

            let missing: BTreeSet<RowPath> = records
                .iter()
                .map(|r| RowPath::new(r.group_path(arity)))
                .filter(|p| !structured.contains(p))
                .collect();
            for path in missing {
                log::warn!(
                    "group {:?} has records but is missing from the group structure; shown empty",
                    path.keys()
                );
                register(&path, &mut order);
                leaves.insert(path);
            }
        }
        leaves.extend(structured.iter().cloned());

        // Drop group paths with no leaf below them.
        let live: HashSet<RowPath> = leaves
            .iter()
            .flat_map(|leaf| (1..=leaf.depth()).map(move |d| leaf.prefix(d)))
            .collect();
        let mut dropped = 0;
        for path in order {
            if path.depth() > 0 && !live.contains(&path) {
                dropped += 1;
                continue;
            }
            let leaf = leaves.contains(&path);
            tree.push_node(path, leaf);
        }
        if dropped > 0 {
            log::debug!("dropped {} group rows without children", dropped);
        }

        for record in records {
            let path = RowPath::new(record.group_path(arity));
            if !structured.contains(&path) {
                continue;
            }
            if let Some(&id) = tree.index.get(&path) {
                if let RowKind::Leaf { intervals, .. } = &mut tree.nodes[id].kind {
                    intervals.push(record.clone());
                    tree.placement.insert(record.id, id);
                }
            }
        }
        for node in &mut tree.nodes {
            if let RowKind::Leaf { intervals, .. } = &mut node.kind {
                intervals.sort_by(|a, b| (a.start, a.id).cmp(&(b.start, b.id)));
            }
        }
        tree
    }

    fn push_node(&mut self, path: RowPath, leaf: bool) {
        let id = self.nodes.len();
        let parent = path.parent().and_then(|p| self.index.get(&p).copied());
        let depth = path.depth();
        let field = depth
            .checked_sub(1)
            .and_then(|d| self.group_fields.get(d))
            .cloned();
        let (kind, is_open) = if leaf {
            (
                RowKind::Leaf {
                    intervals: Vec::new(),
                    packing: Packing::default(),
                    unavailable: BTreeMap::new(),
                },
                true,
            )
        } else {
            (
                RowKind::Group {
                    aggregate: Vec::new(),
                },
                self.open_state.is_open(&path, self.collapse_first_level),
            )
        };
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        self.index.insert(path.clone(), id);
        self.nodes.push(RowNode {
            path,
            field,
            parent,
            children: Vec::new(),
            is_open,
            kind,
        });
    }

    /// Packs every leaf row over `window`.
    pub fn pack(&mut self, window: &TimeSpan) {
        for node in &mut self.nodes {
            if let RowKind::Leaf {
                intervals, packing, ..
            } = &mut node.kind
            {
                *packing = IntervalPacker::pack(intervals.iter(), window);
            }
        }
    }

    /// Computes aggregates for every group row over `window`.
    ///
    /// The maximum is looked up for the first grouping dimension.
    pub fn consolidate(&mut self, window: &TimeSpan, config: Option<&ConsolidationConfig>) {
        let consolidator =
            Consolidator::for_row(config, self.group_fields.first().map(String::as_str));
        for id in 0..self.nodes.len() {
            if self.nodes[id].is_leaf() {
                continue;
            }
            let segments = consolidator.consolidate(self.descendant_intervals(id), window);
            if let RowKind::Group { aggregate } = &mut self.nodes[id].kind {
                *aggregate = segments;
            }
        }
    }

    /// Stores per-row unavailability marks on a leaf row.
    pub fn set_unavailable(&mut self, id: NodeId, marks: BTreeMap<usize, bool>) {
        if let Some(RowNode {
            kind: RowKind::Leaf { unavailable, .. },
            ..
        }) = self.nodes.get_mut(id)
        {
            *unavailable = marks;
        }
    }

    /// Flips one group row. Children keep their own state.
    ///
    /// Returns the new state, or `None` when `path` is not a group row.
    pub fn toggle(&mut self, path: &RowPath) -> Option<bool> {
        let id = self.find(path)?;
        if self.nodes[id].is_leaf() {
            return None;
        }
        let open = self.open_state.toggle(path, self.collapse_first_level);
        self.nodes[id].is_open = open;
        Some(open)
    }

    pub fn expand_all(&mut self) {
        self.open_state.expand_all();
        self.refresh_open();
    }

    pub fn collapse_all(&mut self) {
        self.open_state.collapse_all();
        self.refresh_open();
    }

    fn refresh_open(&mut self) {
        for node in &mut self.nodes {
            if !node.is_leaf() {
                node.is_open = self.open_state.is_open(&node.path, self.collapse_first_level);
            }
        }
    }

    /// Visible rows, depth first. Descendants of closed rows are skipped.
    pub fn visible_rows(&self) -> Vec<NodeId> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            rows.push(id);
            let node = &self.nodes[id];
            if node.is_open {
                stack.extend(node.children.iter().rev());
            }
        }
        rows
    }

    /// Vertical bands of the visible rows.
    ///
    /// Group rows take one level; leaf rows `max(levels, 1)` levels.
    pub fn layout(&self, level_height: f64) -> Vec<RowBand> {
        let mut top = 0.0;
        self.visible_rows()
            .into_iter()
            .map(|id| {
                let node = &self.nodes[id];
                let height = node
                    .packing()
                    .map_or(level_height, |p| p.row_height_px(level_height));
                let band = RowBand {
                    node: id,
                    path: node.path.clone(),
                    top,
                    height,
                    is_leaf: node.is_leaf(),
                };
                top += height;
                band
            })
            .collect()
    }

    pub fn find(&self, path: &RowPath) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&RowNode> {
        self.nodes.get(id)
    }

    pub fn get(&self, path: &RowPath) -> Option<&RowNode> {
        self.find(path).map(|id| &self.nodes[id])
    }

    pub fn nodes(&self) -> &[RowNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf row holding the interval.
    pub fn leaf_for_interval(&self, id: IntervalId) -> Option<NodeId> {
        self.placement.get(&id).copied()
    }

    /// The interval with this id.
    pub fn interval(&self, id: IntervalId) -> Option<&Interval> {
        let leaf = self.leaf_for_interval(id)?;
        self.nodes[leaf].intervals().iter().find(|iv| iv.id == id)
    }

    /// Number of displayed intervals.
    pub fn interval_count(&self) -> usize {
        self.placement.len()
    }

    /// Every leaf interval below `id`.
    pub fn descendant_intervals(&self, id: NodeId) -> Vec<&Interval> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.extend(node.intervals());
            stack.extend(node.children.iter().copied());
        }
        out
    }

    /// Every displayed interval.
    pub fn all_intervals(&self) -> impl Iterator<Item = &Interval> {
        self.nodes.iter().flat_map(RowNode::intervals)
    }

    /// Group values of a row (field → key).
    pub fn group_values(&self, id: NodeId) -> BTreeMap<String, GroupKey> {
        let Some(node) = self.nodes.get(id) else {
            return BTreeMap::new();
        };
        self.group_fields
            .iter()
            .cloned()
            .zip(node.path.keys().iter().cloned())
            .collect()
    }

    pub fn group_fields(&self) -> &[String] {
        &self.group_fields
    }

    pub fn open_state(&self) -> &OpenState {
        &self.open_state
    }

    pub fn into_open_state(self) -> OpenState {
        self.open_state
    }
}
