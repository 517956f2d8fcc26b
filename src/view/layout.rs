//! One computed view cycle.
//!
//! Columns, rows, levels and aggregates are rebuilt together from a fetch
//! payload; nothing is patched incrementally.

use crate::config::GanttConfig;
use crate::consolidation::Consolidator;
use crate::error::GanttResult;
use crate::models::{AggregateSegment, IntervalId, Timestamp};
use crate::rows::{NodeId, OpenState, RowBand, RowPath, RowTree};
use crate::scale::TimeGrid;
use crate::validation::sanitize_records;

use super::source::FetchPayload;

/// Placement of one pill, in column units and pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PillGeometry {
    pub interval_id: IntervalId,
    pub row: RowPath,
    pub level: usize,
    /// Left edge in columns.
    pub left: f64,
    /// Width in columns, at least one precision step.
    pub width: f64,
    /// Top edge in pixels, when the row is visible.
    pub top_px: Option<f64>,
}

/// Computed structures handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttLayout {
    grid: TimeGrid,
    rows: RowTree,
    bands: Vec<RowBand>,
    total: Option<Vec<AggregateSegment>>,
    level_height: f64,
}

impl GanttLayout {
    /// Builds every structure for `payload` under `config`.
    pub fn compute(
        config: &GanttConfig,
        payload: &FetchPayload,
        open_state: OpenState,
        now: Timestamp,
    ) -> GanttResult<Self> {
        let mut grid = TimeGrid::build(&config.time, now)?;
        if config.display_unavailability && !config.per_row_unavailability {
            grid.mark_unavailable(&payload.unavailability.global);
        }
        let window = grid.window();

        let records = sanitize_records(payload.response.records.clone(), config.group_by.len());
        let mut rows = RowTree::build(
            &records,
            &config.group_by,
            &payload.response.groups,
            open_state,
            config.effective_collapse_first_level(),
        );
        rows.pack(&window);
        rows.consolidate(&window, config.consolidation.as_ref());

        if config.display_unavailability && config.per_row_unavailability {
            for (path, marks) in &payload.unavailability.per_row {
                if let Some(id) = rows.find(path) {
                    rows.set_unavailable(id, marks.clone());
                }
            }
        }

        let total = config.total_row.then(|| {
            Consolidator::for_row(config.consolidation.as_ref(), None)
                .consolidate(rows.all_intervals(), &window)
        });
        let bands = rows.layout(config.level_height_px);
        log::debug!(
            "layout: {} rows, {} intervals, {} visible",
            rows.len(),
            rows.interval_count(),
            bands.len()
        );
        Ok(Self {
            grid,
            rows,
            bands,
            total,
            level_height: config.level_height_px,
        })
    }

    #[inline]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    #[inline]
    pub fn rows(&self) -> &RowTree {
        &self.rows
    }

    /// Visible row bands, top to bottom.
    pub fn bands(&self) -> &[RowBand] {
        &self.bands
    }

    /// Total row segments, when enabled.
    pub fn total(&self) -> Option<&[AggregateSegment]> {
        self.total.as_deref()
    }

    /// Flips a group row and recomputes the bands.
    pub fn toggle(&mut self, path: &RowPath) -> Option<bool> {
        let open = self.rows.toggle(path)?;
        self.bands = self.rows.layout(self.level_height);
        Some(open)
    }

    pub fn expand_all(&mut self) {
        self.rows.expand_all();
        self.bands = self.rows.layout(self.level_height);
    }

    pub fn collapse_all(&mut self) {
        self.rows.collapse_all();
        self.bands = self.rows.layout(self.level_height);
    }

    fn band_top(&self, node: NodeId) -> Option<f64> {
        self.bands.iter().find(|b| b.node == node).map(|b| b.top)
    }

    /// Confirmed geometry of a pill.
    pub fn pill_geometry(&self, id: IntervalId) -> Option<PillGeometry> {
        let node_id = self.rows.leaf_for_interval(id)?;
        let node = self.rows.node(node_id)?;
        let interval = self.rows.interval(id)?;
        let level = node.packing().and_then(|p| p.level_of(id))?;
        let span = self.grid.clamp(interval.start, interval.stop)?;
        Some(PillGeometry {
            interval_id: id,
            row: node.path.clone(),
            level,
            left: self.grid.column_position(span.start),
            width: self
                .grid
                .span_in_columns(span.start, span.stop)
                .max(self.grid.step_in_columns()),
            top_px: self
                .band_top(node_id)
                .map(|top| top + level as f64 * self.level_height),
        })
    }

    /// Geometry of a pill moved to `[start, stop)` on `row`.
    ///
    /// Keeps the confirmed level on the same row; another row shows it on
    /// level 0 until the response is applied.
    pub fn moved_geometry(
        &self,
        id: IntervalId,
        start: Timestamp,
        stop: Option<Timestamp>,
        row: &RowPath,
    ) -> Option<PillGeometry> {
        let confirmed = self.pill_geometry(id);
        let span = self.grid.clamp(start, stop)?;
        let node_id = self.rows.find(row);
        let level = match &confirmed {
            Some(g) if &g.row == row => g.level,
            _ => 0,
        };
        Some(PillGeometry {
            interval_id: id,
            row: row.clone(),
            level,
            left: self.grid.column_position(span.start),
            width: self
                .grid
                .span_in_columns(span.start, span.stop)
                .max(self.grid.step_in_columns()),
            top_px: node_id
                .and_then(|n| self.band_top(n))
                .map(|top| top + level as f64 * self.level_height),
        })
    }
}
