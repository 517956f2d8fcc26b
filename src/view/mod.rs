//! View orchestration.
//!
//! [`GanttView`] is a sans-IO state machine tying the components together.
//! User operations return a [`FetchRequest`] or a [`PendingMutation`]
//! tagged with a sequencer token; the host performs the I/O and feeds the
//! result back through [`GanttView::apply_fetch`] or
//! [`GanttView::apply_mutation_result`]. [`GanttSession`] does this against
//! a synchronous [`RecordSource`].
//!
//! # Response handling
//! - Only the response to the latest request is applied, at most once.
//! - A failed fetch keeps the last applied layout.
//! - A confirmed mutation triggers a reload; the layout is never derived
//!   from the optimistic edit.
//! - A rejected mutation rebuilds the layout from the last confirmed
//!   payload.

mod layout;
mod session;
mod source;

pub use layout::{GanttLayout, PillGeometry};
pub use session::GanttSession;
pub use source::{
    FetchPayload, FetchQuery, FetchResponse, InMemorySource, RecordSource, Unavailability,
    UnavailabilityMap,
};

use serde_json::{Map, Value};

use crate::config::GanttConfig;
use crate::error::{GanttError, GanttResult, SourceError};
use crate::interaction::{
    Edge, GestureContext, GestureOutcome, InteractionController, InteractionSettings,
    InteractionState, PillRef, PillTarget, Point,
};
use crate::models::{Column, IntervalId, PendingMutation, PrefilledFields};
use crate::rows::RowPath;
use crate::scale::{Clock, Scale, SystemClock, TimeGrid};
use crate::sequencer::{RequestKind, RequestSequencer, RequestToken};

/// Default column width (px).
pub const DEFAULT_COLUMN_WIDTH_PX: f64 = 40.0;

/// A fetch the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub token: RequestToken,
    pub kind: RequestKind,
    /// Configuration the response will be laid out with.
    pub config: GanttConfig,
    pub query: FetchQuery,
    /// Columns of the requested window (for unavailability).
    pub columns: Vec<Column>,
}

impl FetchRequest {
    /// Rows to ask unavailability for, if any.
    pub fn unavailability_rows(&self, response: &FetchResponse) -> Vec<RowPath> {
        if !self.config.display_unavailability || !self.config.per_row_unavailability {
            return Vec::new();
        }
        response.leaf_paths(self.config.group_by.len())
    }
}

/// What happened to a fetch response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Laid out and displayed.
    Applied,
    /// A newer request exists; dropped.
    Stale,
    /// The fetch failed; the previous layout stays.
    Failed(SourceError),
}

/// What happened to a mutation result.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Accepted; perform this reload.
    Confirmed(FetchRequest),
    /// Rejected; the layout was rebuilt from confirmed data.
    Reverted(SourceError),
    /// A newer request exists; the result is ignored.
    Superseded,
}

/// The timeline view.
#[derive(Debug)]
pub struct GanttView<C: Clock = SystemClock> {
    /// Configuration of the displayed layout.
    config: GanttConfig,
    /// Configuration of the latest request.
    requested: GanttConfig,
    clock: C,
    sequencer: RequestSequencer,
    controller: InteractionController,
    layout: Option<GanttLayout>,
    confirmed: Option<FetchPayload>,
    render_count: usize,
    column_width_px: f64,
}

impl GanttView<SystemClock> {
    pub fn new(config: GanttConfig) -> GanttResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> GanttView<C> {
    /// Creates a view reading the current time from `clock`.
    pub fn with_clock(config: GanttConfig, clock: C) -> GanttResult<Self> {
        config.validate()?;
        let controller = InteractionController::new(settings_for(&config));
        Ok(Self {
            requested: config.clone(),
            config,
            clock,
            sequencer: RequestSequencer::new(),
            controller,
            layout: None,
            confirmed: None,
            render_count: 0,
            column_width_px: DEFAULT_COLUMN_WIDTH_PX,
        })
    }

    pub fn with_column_width(mut self, px: f64) -> Self {
        self.column_width_px = px;
        self
    }

    pub fn set_column_width(&mut self, px: f64) {
        self.column_width_px = px;
    }

    /// Configuration of the displayed layout.
    pub fn config(&self) -> &GanttConfig {
        &self.config
    }

    /// Configuration of the latest request.
    pub fn requested_config(&self) -> &GanttConfig {
        &self.requested
    }

    pub fn layout(&self) -> Option<&GanttLayout> {
        self.layout.as_ref()
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    /// Number of layout rebuilds so far.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    // ---- requests ----

    /// Reloads the current configuration.
    pub fn reload(&mut self) -> GanttResult<FetchRequest> {
        self.request(RequestKind::Reload, self.requested.clone())
    }

    /// Switches scale, keeping the focus date.
    pub fn set_scale(&mut self, scale: Scale) -> GanttResult<FetchRequest> {
        let mut config = self.requested.clone();
        config.time = config.time.with_scale(scale);
        self.request(RequestKind::ScaleChange, config)
    }

    pub fn next(&mut self) -> GanttResult<FetchRequest> {
        let mut config = self.requested.clone();
        config.time = config.time.next()?;
        self.request(RequestKind::Navigation, config)
    }

    pub fn previous(&mut self) -> GanttResult<FetchRequest> {
        let mut config = self.requested.clone();
        config.time = config.time.previous()?;
        self.request(RequestKind::Navigation, config)
    }

    /// Focuses on the current date.
    pub fn today(&mut self) -> GanttResult<FetchRequest> {
        let mut config = self.requested.clone();
        config.time = config.time.today(self.clock.now())?;
        self.request(RequestKind::Navigation, config)
    }

    fn request(&mut self, kind: RequestKind, config: GanttConfig) -> GanttResult<FetchRequest> {
        let grid = TimeGrid::build(&config.time, self.clock.now())?;
        let query = FetchQuery {
            scale: config.time.scale,
            window: grid.window(),
            group_by: config.group_by.clone(),
            measure_field: config.consolidation.as_ref().map(|c| c.measure_field.clone()),
            exclude_field: config.consolidation.as_ref().and_then(|c| c.exclude_field.clone()),
        };
        let token = self.sequencer.issue(kind);
        self.requested = config.clone();
        Ok(FetchRequest {
            token,
            kind,
            config,
            query,
            columns: grid.columns().to_vec(),
        })
    }

    // ---- responses ----

    /// Applies a fetch result.
    ///
    /// Stale results are dropped. A failure keeps the displayed layout and
    /// configuration.
    pub fn apply_fetch(
        &mut self,
        token: RequestToken,
        result: Result<FetchPayload, SourceError>,
    ) -> GanttResult<ApplyOutcome> {
        if !self.sequencer.accept(token) {
            log::debug!("ignoring response {}", token);
            return Ok(ApplyOutcome::Stale);
        }
        if self.controller.pending().is_some() {
            // The in-flight edit is answered by this newer response.
            self.controller.reset();
        }
        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("fetch {} failed, keeping current view: {}", token, e);
                self.requested = self.config.clone();
                return Ok(ApplyOutcome::Failed(e));
            }
        };

        let config = self.requested.clone();
        self.rebuild(&config, &payload)?;
        self.config = config;
        self.controller.set_settings(settings_for(&self.config));
        self.confirmed = Some(payload);
        Ok(ApplyOutcome::Applied)
    }

    /// Applies the source's answer to a committed mutation.
    pub fn apply_mutation_result(
        &mut self,
        mutation: &PendingMutation,
        result: Result<(), SourceError>,
    ) -> GanttResult<MutationOutcome> {
        self.controller.finish(mutation.token);
        if !self.sequencer.accept(mutation.token) {
            log::debug!(
                "mutation {} of interval {} superseded",
                mutation.token,
                mutation.interval_id
            );
            return Ok(MutationOutcome::Superseded);
        }
        match result {
            Ok(()) => Ok(MutationOutcome::Confirmed(self.reload()?)),
            Err(e) => {
                log::warn!(
                    "mutation of interval {} rejected, reverting: {}",
                    mutation.interval_id,
                    e
                );
                // Requests dropped in favour of this mutation are gone too.
                self.requested = self.config.clone();
                if let Some(payload) = self.confirmed.take() {
                    let config = self.config.clone();
                    let rebuilt = self.rebuild(&config, &payload);
                    self.confirmed = Some(payload);
                    rebuilt?;
                }
                Ok(MutationOutcome::Reverted(e))
            }
        }
    }

    fn rebuild(&mut self, config: &GanttConfig, payload: &FetchPayload) -> GanttResult<()> {
        let open_state = self
            .layout
            .as_ref()
            .map(|l| l.rows().open_state().clone())
            .unwrap_or_default();
        self.layout = Some(GanttLayout::compute(
            config,
            payload,
            open_state,
            self.clock.now(),
        )?);
        self.render_count += 1;
        Ok(())
    }

    // ---- gestures ----

    fn layout_ref(&self) -> GanttResult<&GanttLayout> {
        self.layout
            .as_ref()
            .ok_or_else(|| GanttError::Config("no layout applied yet".to_string()))
    }

    /// Pointer enters a pill.
    pub fn on_pill_hover(&mut self, pill: PillRef) -> GanttResult<()> {
        let layout = self
            .layout
            .as_ref()
            .ok_or_else(|| GanttError::Config("no layout applied yet".to_string()))?;
        let interval = match pill.target {
            PillTarget::Interval(id) => Some(
                layout
                    .rows()
                    .interval(id)
                    .ok_or(GanttError::UnknownInterval { id })?,
            ),
            PillTarget::Aggregate => None,
        };
        self.controller.pointer_enter(pill, interval, layout.grid());
        Ok(())
    }

    pub fn on_pill_leave(&mut self) {
        self.controller.pointer_leave();
    }

    /// Pointer pressed on a pill body.
    pub fn on_pill_pointer_down(&mut self, pill: PillRef, at: Point) -> GanttResult<()> {
        self.on_pill_hover(pill)?;
        self.controller.pointer_down(at);
        Ok(())
    }

    /// Pointer pressed on a resize handle. Returns `false` when the pill
    /// has no handle on that edge.
    pub fn on_resize_handle_pointer_down(
        &mut self,
        pill: PillRef,
        edge: Edge,
        at: Point,
    ) -> GanttResult<bool> {
        let PillTarget::Interval(id) = pill.target else {
            return Ok(false);
        };
        self.on_pill_hover(pill)?;
        let layout = self.layout_ref()?;
        let interval = layout
            .rows()
            .interval(id)
            .ok_or(GanttError::UnknownInterval { id })?
            .clone();
        Ok(self.controller.resize_down(edge, at, &interval))
    }

    pub fn on_pointer_move(&mut self, at: Point) -> GanttResult<()> {
        let Some(layout) = self.layout.as_ref() else {
            return Ok(());
        };
        let hovered = match self.controller.state() {
            InteractionState::Hovering {
                pill:
                    PillRef {
                        target: PillTarget::Interval(id),
                        ..
                    },
                ..
            } => layout.rows().interval(*id),
            _ => None,
        };
        let ctx = GestureContext {
            grid: layout.grid(),
            bands: layout.bands(),
            group_fields: &self.config.group_by,
            column_width_px: self.column_width_px,
        };
        self.controller.pointer_move(at, hovered, &ctx);
        Ok(())
    }

    /// Pointer released. A `Commit` outcome must be sent to the source and
    /// its result passed to [`apply_mutation_result`](Self::apply_mutation_result).
    pub fn on_pointer_up(&mut self) -> GanttResult<GestureOutcome> {
        let Some(layout) = self.layout.as_ref() else {
            return Ok(GestureOutcome::Ignored);
        };
        let ctx = GestureContext {
            grid: layout.grid(),
            bands: layout.bands(),
            group_fields: &self.config.group_by,
            column_width_px: self.column_width_px,
        };
        self.controller.pointer_up(&ctx, &mut self.sequencer)
    }

    /// Aborts the gesture in progress.
    pub fn cancel_gesture(&mut self) {
        self.controller.cancel();
    }

    /// Flips a group row. Returns the new state.
    pub fn on_group_header_click(&mut self, path: &RowPath) -> Option<bool> {
        self.layout.as_mut()?.toggle(path)
    }

    pub fn expand_all(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            layout.expand_all();
        }
    }

    pub fn collapse_all(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            layout.collapse_all();
        }
    }

    // ---- renderer queries ----

    /// Displayed geometry of a pill, including an edit in progress or in
    /// flight.
    pub fn pill_geometry(&self, id: IntervalId) -> Option<PillGeometry> {
        let layout = self.layout.as_ref()?;
        match self.controller.preview(layout.grid()) {
            Some(p) if p.interval_id == id => {
                layout.moved_geometry(id, p.start, p.stop, &p.row)
            }
            _ => layout.pill_geometry(id),
        }
    }

    /// Creation defaults for a cell.
    pub fn prefill_for_cell(&self, row: &RowPath, column: usize) -> Option<PrefilledFields> {
        let layout = self.layout.as_ref()?;
        let column = layout.grid().column(column)?;
        let node = layout.rows().find(row)?;
        Some(PrefilledFields {
            start: column.start,
            stop: column.stop,
            group_values: layout.rows().group_values(node),
        })
    }

    /// Source payload for a mutation.
    pub fn mutation_payload(&self, mutation: &PendingMutation) -> Map<String, Value> {
        mutation.changes.to_payload(self.config.date_fields())
    }

    /// Source payload for a creation.
    pub fn create_payload(&self, fields: &PrefilledFields) -> Map<String, Value> {
        fields.to_payload(self.config.date_fields())
    }
}

fn settings_for(config: &GanttConfig) -> InteractionSettings {
    InteractionSettings {
        editable: config.editable,
        drag_threshold_px: config.drag_threshold_px,
        row_switch_threshold_px: config.row_switch_threshold_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupKey, Interval, Timestamp};
    use crate::rows::GroupStructure;
    use crate::scale::{FixedClock, TimeScaleConfig};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn at(month: u32, day: u32, hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2018, month, day, hour, 0, 0).unwrap()
    }

    fn config() -> GanttConfig {
        GanttConfig::new(TimeScaleConfig::new(
            Scale::Month,
            NaiveDate::from_ymd_opt(2018, 12, 20).unwrap(),
        ))
        .with_group_by(["user_id"])
    }

    fn view() -> GanttView<FixedClock> {
        GanttView::with_clock(config(), FixedClock(at(12, 20, 8))).unwrap()
    }

    fn payload(records: Vec<Interval>) -> FetchPayload {
        FetchPayload::from(FetchResponse {
            groups: GroupStructure::from_records(&records, 1),
            records,
        })
    }

    fn december() -> Vec<Interval> {
        vec![
            Interval::new(1, at(12, 10, 0), at(12, 12, 0)).with_group_key("Alice"),
            Interval::new(2, at(12, 11, 0), at(12, 14, 0)).with_group_key("Alice"),
        ]
    }

    fn loaded() -> GanttView<FixedClock> {
        let mut v = view();
        let req = v.reload().unwrap();
        assert_eq!(
            v.apply_fetch(req.token, Ok(payload(december()))).unwrap(),
            ApplyOutcome::Applied
        );
        v
    }

    #[test]
    fn test_request_carries_window() {
        let mut v = view();
        let req = v.reload().unwrap();
        assert_eq!(req.kind, RequestKind::Reload);
        assert_eq!(req.query.window.start, at(12, 1, 0));
        assert_eq!(req.columns.len(), 31);
        assert!(v.layout().is_none());
    }

    #[test]
    fn test_stale_scale_switch_dropped() {
        let mut v = loaded();
        let renders = v.render_count();

        let week = v.set_scale(Scale::Week).unwrap();
        let year = v.set_scale(Scale::Year).unwrap();
        let year_records: Vec<Interval> = (10..15)
            .map(|id| Interval::new(id, at(3, 1, 0), at(3, 2, 0)).with_group_key("Bob"))
            .collect();
        assert_eq!(
            v.apply_fetch(year.token, Ok(payload(year_records))).unwrap(),
            ApplyOutcome::Applied
        );
        assert_eq!(v.config().time.scale, Scale::Year);

        assert_eq!(
            v.apply_fetch(week.token, Ok(payload(december()))).unwrap(),
            ApplyOutcome::Stale
        );
        assert_eq!(v.config().time.scale, Scale::Year);
        assert_eq!(v.layout().unwrap().rows().interval_count(), 5);
        assert_eq!(v.layout().unwrap().grid().len(), 12);
        assert_eq!(v.render_count(), renders + 1);
    }

    #[test]
    fn test_stale_dropped_before_newest_arrives() {
        let mut v = loaded();
        let week = v.set_scale(Scale::Week).unwrap();
        let _year = v.set_scale(Scale::Year).unwrap();
        assert_eq!(v.apply_fetch(week.token, Ok(payload(vec![]))).unwrap(), ApplyOutcome::Stale);
        // Still showing the last applied state.
        assert_eq!(v.config().time.scale, Scale::Month);
        assert_eq!(v.layout().unwrap().rows().interval_count(), 2);
    }

    #[test]
    fn test_fetch_failure_keeps_layout() {
        let mut v = loaded();
        let before = v.layout().cloned();
        let req = v.next().unwrap();
        let outcome = v
            .apply_fetch(req.token, Err(SourceError::Unavailable("timeout".to_string())))
            .unwrap();
        assert!(matches!(outcome, ApplyOutcome::Failed(_)));
        assert_eq!(v.layout().cloned(), before);
        assert_eq!(v.requested_config(), v.config());
        assert_eq!(v.render_count(), 1);
    }

    #[test]
    fn test_navigation_bases_on_latest_request() {
        let mut v = loaded();
        v.next().unwrap();
        let req = v.next().unwrap();
        assert_eq!(req.config.time.focus_date, NaiveDate::from_ymd_opt(2019, 2, 20).unwrap());
        let back = v.previous().unwrap();
        assert_eq!(back.config.time.focus_date, NaiveDate::from_ymd_opt(2019, 1, 20).unwrap());
        let today = v.today().unwrap();
        assert_eq!(today.config.time.focus_date, NaiveDate::from_ymd_opt(2018, 12, 20).unwrap());
    }

    #[test]
    fn test_drag_commit_and_confirm() {
        let mut v = loaded();
        let alice = RowPath::from(["Alice"]);
        v.on_pill_pointer_down(PillRef::interval(alice.clone(), 1), Point::new(400.0, 5.0))
            .unwrap();
        v.on_pointer_move(Point::new(440.0, 5.0)).unwrap();
        let GestureOutcome::Commit(m) = v.on_pointer_up().unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(m.proposed_start, at(12, 11, 0));

        let payload_json = v.mutation_payload(&m);
        assert_eq!(payload_json["date_start"], "2018-12-11 00:00:00");
        assert_eq!(payload_json["date_stop"], "2018-12-13 00:00:00");
        assert_eq!(payload_json.len(), 2);

        // Optimistic geometry while in flight.
        assert_eq!(v.pill_geometry(1).unwrap().left, 10.0);

        let MutationOutcome::Confirmed(reload) = v.apply_mutation_result(&m, Ok(())).unwrap() else {
            panic!("expected a reload");
        };
        assert_eq!(reload.kind, RequestKind::Reload);
        assert!(v.controller().pending().is_none());
    }

    #[test]
    fn test_rejected_resize_reverts() {
        let mut v = loaded();
        let alice = RowPath::from(["Alice"]);
        let before = v.pill_geometry(2).unwrap();
        let levels_before = v.layout().unwrap().rows().get(&alice).unwrap().packing().cloned();

        assert!(v
            .on_resize_handle_pointer_down(
                PillRef::interval(alice.clone(), 2),
                Edge::Stop,
                Point::new(560.0, 30.0),
            )
            .unwrap());
        v.on_pointer_move(Point::new(680.0, 30.0)).unwrap();
        let GestureOutcome::Commit(m) = v.on_pointer_up().unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(v.pill_geometry(2).unwrap().width, 6.0);

        let outcome = v
            .apply_mutation_result(&m, Err(SourceError::Rejected("conflict".to_string())))
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::Reverted(_)));
        assert_eq!(v.pill_geometry(2).unwrap(), before);
        assert_eq!(
            v.layout().unwrap().rows().get(&alice).unwrap().packing().cloned(),
            levels_before
        );
        assert_eq!(v.render_count(), 2);
    }

    #[test]
    fn test_superseded_mutation_ignored() {
        let mut v = loaded();
        let alice = RowPath::from(["Alice"]);
        v.on_pill_pointer_down(PillRef::interval(alice, 1), Point::new(400.0, 5.0)).unwrap();
        v.on_pointer_move(Point::new(440.0, 5.0)).unwrap();
        let GestureOutcome::Commit(m) = v.on_pointer_up().unwrap() else {
            panic!("expected a commit");
        };
        let nav = v.next().unwrap();
        assert_eq!(v.apply_mutation_result(&m, Ok(())).unwrap(), MutationOutcome::Superseded);
        assert_eq!(v.apply_fetch(nav.token, Ok(payload(vec![]))).unwrap(), ApplyOutcome::Applied);
        assert!(v.controller().pending().is_none());
    }

    #[test]
    fn test_rejected_mutation_after_dropped_navigation() {
        let mut v = loaded();
        let january = v.next().unwrap();
        let alice = RowPath::from(["Alice"]);
        v.on_pill_pointer_down(PillRef::interval(alice, 1), Point::new(400.0, 5.0)).unwrap();
        v.on_pointer_move(Point::new(440.0, 5.0)).unwrap();
        let GestureOutcome::Commit(m) = v.on_pointer_up().unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(
            v.apply_fetch(january.token, Ok(payload(vec![]))).unwrap(),
            ApplyOutcome::Stale
        );
        let outcome = v
            .apply_mutation_result(&m, Err(SourceError::Rejected("conflict".to_string())))
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::Reverted(_)));

        let december = NaiveDate::from_ymd_opt(2018, 12, 20).unwrap();
        assert_eq!(v.config().time.focus_date, december);
        assert_eq!(v.requested_config(), v.config());
        assert!(!v.sequencer().has_pending());

        let next = v.next().unwrap();
        assert_eq!(next.config.time.focus_date, NaiveDate::from_ymd_opt(2019, 1, 20).unwrap());
    }

    #[test]
    fn test_group_header_click_survives_reload() {
        let mut v = GanttView::with_clock(
            config().with_group_by(["user_id", "project_id"]),
            FixedClock(at(12, 20, 8)),
        )
        .unwrap();
        let records = vec![Interval::new(1, at(12, 1, 0), at(12, 2, 0))
            .with_group_key("Alice")
            .with_group_key("P1")];
        let make = |records: Vec<Interval>| {
            FetchPayload::from(FetchResponse {
                groups: GroupStructure::from_records(&records, 2),
                records,
            })
        };
        let req = v.reload().unwrap();
        v.apply_fetch(req.token, Ok(make(records.clone()))).unwrap();
        assert_eq!(v.on_group_header_click(&RowPath::from(["Alice"])), Some(false));

        let req = v.reload().unwrap();
        v.apply_fetch(req.token, Ok(make(records))).unwrap();
        let layout = v.layout().unwrap();
        assert_eq!(layout.bands().len(), 1);
        assert!(!layout.rows().get(&RowPath::from(["Alice"])).unwrap().is_open);
    }

    #[test]
    fn test_prefill_for_cell() {
        let v = loaded();
        let fields = v.prefill_for_cell(&RowPath::from(["Alice"]), 4).unwrap();
        assert_eq!(fields.start, at(12, 5, 0));
        assert_eq!(fields.stop, at(12, 6, 0));
        assert_eq!(fields.group_values.get("user_id"), Some(&GroupKey::value("Alice")));

        let payload = v.create_payload(&fields);
        assert_eq!(payload["date_start"], "2018-12-05 00:00:00");
        assert_eq!(payload["user_id"], "Alice");
        assert!(v.prefill_for_cell(&RowPath::from(["Nobody"]), 4).is_none());
    }

    #[test]
    fn test_unknown_interval_hover() {
        let mut v = loaded();
        assert!(matches!(
            v.on_pill_hover(PillRef::interval(RowPath::from(["Alice"]), 99)),
            Err(GanttError::UnknownInterval { id: 99 })
        ));
    }
}
