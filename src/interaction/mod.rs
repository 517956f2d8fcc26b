//! Pill interaction state machine.
//!
//! ```text
//! Idle --enter--> Hovering --press+move--> Dragging --+
//!   ^                |  +--handle press--> Resizing ---+ release
//!   +--leave---------+                                 v
//!   ^                                             Committing
//!   +---------------------- finish(token) -------------+
//! ```
//!
//! Horizontal travel snaps to the active precision:
//! `steps = round(dx / snap_width)`. A drag shifts both ends by the same
//! number of steps; a resize moves only the grabbed edge. Vertical travel
//! past the row threshold moves the record to the leaf row under the
//! pointer, reassigning every dimension that differs.
//!
//! Aggregate pills stop at `Hovering`.

mod badge;

pub use badge::{BadgeUnit, ResizeBadge};

use std::collections::BTreeMap;

use crate::error::GanttResult;
use crate::models::{FieldChanges, GroupKey, Interval, IntervalId, PendingMutation, Timestamp};
use crate::rows::{RowBand, RowPath};
use crate::scale::TimeGrid;
use crate::sequencer::{RequestKind, RequestSequencer, RequestToken};

/// What a pill shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillTarget {
    /// A record pill on a leaf row.
    Interval(IntervalId),
    /// An aggregate segment on a group row.
    Aggregate,
}

/// A pill under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillRef {
    pub row: RowPath,
    pub target: PillTarget,
}

impl PillRef {
    pub fn interval(row: RowPath, id: IntervalId) -> Self {
        Self {
            row,
            target: PillTarget::Interval(id),
        }
    }

    pub fn aggregate(row: RowPath) -> Self {
        Self {
            row,
            target: PillTarget::Aggregate,
        }
    }
}

/// Resize edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    Stop,
}

/// Handles attached while hovering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub draggable: bool,
    pub resize_start: bool,
    pub resize_stop: bool,
}

impl Affordances {
    /// Handles for an interval in `grid`.
    ///
    /// An edge outside the window has no handle; open-ended intervals have
    /// no stop handle.
    pub fn for_interval(interval: &Interval, grid: &TimeGrid, editable: bool) -> Self {
        if !editable {
            return Self::default();
        }
        let window = grid.window();
        Self {
            draggable: true,
            resize_start: interval.start >= window.start,
            resize_stop: interval.stop.is_some_and(|stop| stop <= window.stop),
        }
    }

    fn allows(&self, edge: Edge) -> bool {
        match edge {
            Edge::Start => self.resize_start,
            Edge::Stop => self.resize_stop,
        }
    }
}

/// Pointer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    pub editable: bool,
    /// Pointer travel before a press turns into a drag (px).
    pub drag_threshold_px: f64,
    /// Vertical travel before a drag switches rows (px).
    pub row_switch_threshold_px: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            editable: true,
            drag_threshold_px: 3.0,
            row_switch_threshold_px: 12.0,
        }
    }
}

/// Layout the controller reads while a gesture runs.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub grid: &'a TimeGrid,
    /// Visible row bands, top to bottom.
    pub bands: &'a [RowBand],
    /// Grouping fields, outermost first.
    pub group_fields: &'a [String],
    pub column_width_px: f64,
}

/// Pointer position (px, grid body coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An active drag or resize.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    /// Record as it was when the gesture began.
    pub original: Interval,
    pub row: RowPath,
    pub origin: Point,
    /// Snapped horizontal travel in precision steps.
    pub steps: i64,
    /// Destination leaf row when it differs from `row`.
    pub target_row: Option<RowPath>,
}

/// Controller state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering {
        pill: PillRef,
        affordances: Affordances,
        /// Pointer-down position on the pill body, if pressed.
        press: Option<Point>,
    },
    Dragging(Gesture),
    Resizing(Edge, Gesture),
    /// Mutation sent, awaiting the record source.
    Committing {
        mutation: PendingMutation,
        /// Row the record was on before the edit.
        row: RowPath,
    },
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Press and release without travel.
    Clicked(IntervalId),
    /// The edit would stop before it starts; reverted locally.
    Discarded,
    /// Snapped travel was zero.
    Unchanged,
    /// Mutation to send.
    Commit(PendingMutation),
    /// Nothing was in progress.
    Ignored,
}

/// Geometry shown while a gesture runs or a mutation is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct PillPreview {
    pub interval_id: IntervalId,
    pub start: Timestamp,
    pub stop: Option<Timestamp>,
    pub row: RowPath,
    pub badge: Option<ResizeBadge>,
}

/// Turns pointer gestures into proposed mutations.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
    settings: InteractionSettings,
}

impl InteractionController {
    pub fn new(settings: InteractionSettings) -> Self {
        Self {
            state: InteractionState::Idle,
            settings,
        }
    }

    #[inline]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: InteractionSettings) {
        self.settings = settings;
    }

    /// Whether a gesture or a commit is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            InteractionState::Dragging(_)
                | InteractionState::Resizing(..)
                | InteractionState::Committing { .. }
        )
    }

    /// Handles attached to the hovered pill.
    pub fn affordances(&self) -> Affordances {
        match &self.state {
            InteractionState::Hovering { affordances, .. } => *affordances,
            _ => Affordances::default(),
        }
    }

    /// Pointer enters a pill.
    pub fn pointer_enter(&mut self, pill: PillRef, interval: Option<&Interval>, grid: &TimeGrid) {
        if self.is_busy() {
            return;
        }
        let affordances = match (pill.target, interval) {
            (PillTarget::Interval(_), Some(iv)) => {
                Affordances::for_interval(iv, grid, self.settings.editable)
            }
            _ => Affordances::default(),
        };
        self.state = InteractionState::Hovering {
            pill,
            affordances,
            press: None,
        };
    }

    /// Pointer leaves the hovered pill.
    pub fn pointer_leave(&mut self) {
        if let InteractionState::Hovering { press: None, .. } = self.state {
            self.state = InteractionState::Idle;
        }
    }

    /// Pointer pressed on the body of the hovered pill.
    pub fn pointer_down(&mut self, at: Point) {
        if let InteractionState::Hovering { press, .. } = &mut self.state {
            *press = Some(at);
        }
    }

    /// Pointer pressed on a resize handle of the hovered pill.
    ///
    /// Returns `false` when the handle is absent.
    pub fn resize_down(&mut self, edge: Edge, at: Point, interval: &Interval) -> bool {
        let InteractionState::Hovering {
            pill, affordances, ..
        } = &self.state
        else {
            return false;
        };
        if pill.target != PillTarget::Interval(interval.id) || !affordances.allows(edge) {
            return false;
        }
        let gesture = Gesture {
            original: interval.clone(),
            row: pill.row.clone(),
            origin: at,
            steps: 0,
            target_row: None,
        };
        self.state = InteractionState::Resizing(edge, gesture);
        true
    }

    /// Pointer moved.
    pub fn pointer_move(
        &mut self,
        at: Point,
        interval: Option<&Interval>,
        ctx: &GestureContext<'_>,
    ) {
        let threshold = self.settings.drag_threshold_px;
        let row_threshold = self.settings.row_switch_threshold_px;
        match &mut self.state {
            InteractionState::Hovering {
                pill,
                affordances,
                press: Some(origin),
            } => {
                let travelled = (at.x - origin.x).hypot(at.y - origin.y);
                if !affordances.draggable || travelled <= threshold {
                    return;
                }
                let Some(original) =
                    interval.filter(|iv| pill.target == PillTarget::Interval(iv.id))
                else {
                    return;
                };
                let mut gesture = Gesture {
                    original: original.clone(),
                    row: pill.row.clone(),
                    origin: *origin,
                    steps: 0,
                    target_row: None,
                };
                update_drag(&mut gesture, at, ctx, row_threshold);
                log::debug!("drag started on interval {}", original.id);
                self.state = InteractionState::Dragging(gesture);
            }
            InteractionState::Dragging(gesture) => update_drag(gesture, at, ctx, row_threshold),
            InteractionState::Resizing(_, gesture) => {
                gesture.steps = snap_steps(at.x - gesture.origin.x, ctx);
            }
            _ => {}
        }
    }

    /// Pointer released.
    pub fn pointer_up(
        &mut self,
        ctx: &GestureContext<'_>,
        sequencer: &mut RequestSequencer,
    ) -> GanttResult<GestureOutcome> {
        let state = std::mem::take(&mut self.state);
        let (edge, gesture) = match state {
            InteractionState::Hovering {
                pill,
                affordances,
                press: Some(_),
            } => {
                let outcome = match pill.target {
                    PillTarget::Interval(id) => GestureOutcome::Clicked(id),
                    PillTarget::Aggregate => GestureOutcome::Ignored,
                };
                self.state = InteractionState::Hovering {
                    pill,
                    affordances,
                    press: None,
                };
                return Ok(outcome);
            }
            InteractionState::Dragging(gesture) => (None, gesture),
            InteractionState::Resizing(edge, gesture) => (Some(edge), gesture),
            other => {
                self.state = other;
                return Ok(GestureOutcome::Ignored);
            }
        };

        let (start, stop) = proposed_span(&gesture, edge, ctx.grid)?;
        if stop.is_some_and(|stop| stop < start) {
            log::debug!("discarding degenerate edit of interval {}", gesture.original.id);
            return Ok(GestureOutcome::Discarded);
        }

        let mut changes = FieldChanges::default();
        if start != gesture.original.start {
            changes.start = Some(start);
        }
        if stop != gesture.original.stop {
            changes.stop = stop;
        }
        let mut proposed_group_keys = None;
        if let Some(target) = &gesture.target_row {
            changes.group_keys = changed_keys(&gesture.row, target, ctx.group_fields);
            proposed_group_keys = Some(target.keys().to_vec());
        }
        if changes.is_empty() {
            return Ok(GestureOutcome::Unchanged);
        }

        let mutation = PendingMutation {
            interval_id: gesture.original.id,
            proposed_start: start,
            proposed_stop: stop,
            proposed_group_keys,
            changes,
            token: sequencer.issue(RequestKind::Mutation),
        };
        log::info!(
            "committing interval {} with token {}",
            mutation.interval_id,
            mutation.token
        );
        self.state = InteractionState::Committing {
            mutation: mutation.clone(),
            row: gesture.row,
        };
        Ok(GestureOutcome::Commit(mutation))
    }

    /// Aborts any gesture in progress. A commit already sent is kept.
    pub fn cancel(&mut self) {
        if !matches!(self.state, InteractionState::Committing { .. }) {
            self.state = InteractionState::Idle;
        }
    }

    /// Drops any gesture or commit.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Ends the commit carrying `token`. Returns `false` if none matched.
    pub fn finish(&mut self, token: RequestToken) -> bool {
        match &self.state {
            InteractionState::Committing { mutation, .. } if mutation.token == token => {
                self.state = InteractionState::Idle;
                true
            }
            _ => false,
        }
    }

    /// In-flight mutation, if any.
    pub fn pending(&self) -> Option<&PendingMutation> {
        match &self.state {
            InteractionState::Committing { mutation, .. } => Some(mutation),
            _ => None,
        }
    }

    /// Geometry to draw for the edited pill.
    pub fn preview(&self, grid: &TimeGrid) -> Option<PillPreview> {
        match &self.state {
            InteractionState::Dragging(g) => self.gesture_preview(g, None, grid),
            InteractionState::Resizing(edge, g) => self.gesture_preview(g, Some(*edge), grid),
            InteractionState::Committing { mutation, row } => Some(PillPreview {
                interval_id: mutation.interval_id,
                start: mutation.proposed_start,
                stop: mutation.proposed_stop,
                row: mutation
                    .proposed_group_keys
                    .clone()
                    .map_or_else(|| row.clone(), RowPath::new),
                badge: None,
            }),
            _ => None,
        }
    }

    fn gesture_preview(
        &self,
        g: &Gesture,
        edge: Option<Edge>,
        grid: &TimeGrid,
    ) -> Option<PillPreview> {
        let (start, stop) = proposed_span(g, edge, grid).ok()?;
        let badge = edge.map(|edge| ResizeBadge::new(edge, g.steps, grid.precision()));
        Some(PillPreview {
            interval_id: g.original.id,
            start,
            stop,
            row: g.target_row.clone().unwrap_or_else(|| g.row.clone()),
            badge,
        })
    }
}

fn snap_steps(dx: f64, ctx: &GestureContext<'_>) -> i64 {
    let snap = ctx.grid.snap_width_px(ctx.column_width_px);
    if snap <= 0.0 {
        return 0;
    }
    (dx / snap).round() as i64
}

fn update_drag(gesture: &mut Gesture, at: Point, ctx: &GestureContext<'_>, row_threshold: f64) {
    gesture.steps = snap_steps(at.x - gesture.origin.x, ctx);
    gesture.target_row = None;
    if ctx.group_fields.is_empty() || (at.y - gesture.origin.y).abs() <= row_threshold {
        return;
    }
    if let Some(band) = ctx.bands.iter().find(|b| b.contains(at.y)) {
        if band.is_leaf && band.path != gesture.row {
            gesture.target_row = Some(band.path.clone());
        }
    }
}

fn proposed_span(
    gesture: &Gesture,
    edge: Option<Edge>,
    grid: &TimeGrid,
) -> GanttResult<(Timestamp, Option<Timestamp>)> {
    let iv = &gesture.original;
    let shift = |t: Timestamp| grid.shift(t, gesture.steps);
    Ok(match edge {
        None => (shift(iv.start)?, iv.stop.map(shift).transpose()?),
        Some(Edge::Start) => (shift(iv.start)?, iv.stop),
        Some(Edge::Stop) => (iv.start, iv.stop.map(shift).transpose()?),
    })
}

fn changed_keys(from: &RowPath, to: &RowPath, fields: &[String]) -> BTreeMap<String, GroupKey> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(i, field)| {
            let new = to.keys().get(i)?;
            (from.keys().get(i) != Some(new)).then(|| (field.clone(), new.clone()))
        })
        .collect()
}
