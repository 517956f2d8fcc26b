//! Synchronous driver.
//!
//! Runs every request of a [`GanttView`] against a [`RecordSource`] right
//! away. Hosts with asynchronous transport drive the view directly.

use crate::config::GanttConfig;
use crate::error::{GanttResult, SourceError};
use crate::interaction::GestureOutcome;
use crate::models::{IntervalId, PendingMutation};
use crate::rows::RowPath;
use crate::scale::{Clock, Scale, SystemClock};

use super::source::{FetchPayload, RecordSource, Unavailability};
use super::{ApplyOutcome, FetchRequest, GanttView, MutationOutcome};

/// Result of [`GanttSession::release`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    /// No mutation was produced.
    Gesture(GestureOutcome),
    /// The source accepted the edit and the view was reloaded.
    Saved(PendingMutation),
    /// The source rejected the edit; the pill is back where it was.
    Reverted(SourceError),
    Superseded,
}

/// A view bound to a record source.
#[derive(Debug)]
pub struct GanttSession<S: RecordSource, C: Clock = SystemClock> {
    source: S,
    view: GanttView<C>,
}

impl<S: RecordSource> GanttSession<S, SystemClock> {
    pub fn new(source: S, config: GanttConfig) -> GanttResult<Self> {
        Ok(Self {
            source,
            view: GanttView::new(config)?,
        })
    }
}

impl<S: RecordSource, C: Clock> GanttSession<S, C> {
    pub fn with_clock(source: S, config: GanttConfig, clock: C) -> GanttResult<Self> {
        Ok(Self {
            source,
            view: GanttView::with_clock(config, clock)?,
        })
    }

    pub fn view(&self) -> &GanttView<C> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut GanttView<C> {
        &mut self.view
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Fetches and lays out the current configuration.
    pub fn load(&mut self) -> GanttResult<ApplyOutcome> {
        let request = self.view.reload()?;
        self.run(request)
    }

    pub fn set_scale(&mut self, scale: Scale) -> GanttResult<ApplyOutcome> {
        let request = self.view.set_scale(scale)?;
        self.run(request)
    }

    pub fn next(&mut self) -> GanttResult<ApplyOutcome> {
        let request = self.view.next()?;
        self.run(request)
    }

    pub fn previous(&mut self) -> GanttResult<ApplyOutcome> {
        let request = self.view.previous()?;
        self.run(request)
    }

    pub fn today(&mut self) -> GanttResult<ApplyOutcome> {
        let request = self.view.today()?;
        self.run(request)
    }

    /// Performs one fetch request and applies it.
    pub fn run(&mut self, request: FetchRequest) -> GanttResult<ApplyOutcome> {
        let result = self.fetch(&request);
        self.view.apply_fetch(request.token, result)
    }

    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchPayload, SourceError> {
        let response = self.source.fetch_records(&request.query)?;
        let mut unavailability = Unavailability::default();
        if request.config.display_unavailability {
            if request.config.per_row_unavailability {
                for row in request.unavailability_rows(&response) {
                    let marks = self
                        .source
                        .fetch_unavailability(&request.columns, Some(&row))?;
                    unavailability.per_row.insert(row, marks);
                }
            } else {
                unavailability.global = self.source.fetch_unavailability(&request.columns, None)?;
            }
        }
        Ok(FetchPayload {
            response,
            unavailability,
        })
    }

    /// Releases the pointer and, for a committed edit, sends it to the
    /// source.
    pub fn release(&mut self) -> GanttResult<ReleaseOutcome> {
        let outcome = self.view.on_pointer_up()?;
        let GestureOutcome::Commit(mutation) = outcome else {
            return Ok(ReleaseOutcome::Gesture(outcome));
        };
        let payload = self.view.mutation_payload(&mutation);
        let result = self.source.mutate(mutation.interval_id, &payload);
        match self.view.apply_mutation_result(&mutation, result)? {
            MutationOutcome::Confirmed(reload) => {
                if let ApplyOutcome::Failed(e) = self.run(reload)? {
                    log::warn!(
                        "reload after saving interval {} failed: {}",
                        mutation.interval_id,
                        e
                    );
                }
                Ok(ReleaseOutcome::Saved(mutation))
            }
            MutationOutcome::Reverted(e) => Ok(ReleaseOutcome::Reverted(e)),
            MutationOutcome::Superseded => Ok(ReleaseOutcome::Superseded),
        }
    }

    /// Creates a record in an empty cell and reloads.
    ///
    /// Returns `None` when the row or column does not exist.
    pub fn create(&mut self, row: &RowPath, column: usize) -> GanttResult<Option<IntervalId>> {
        let Some(fields) = self.view.prefill_for_cell(row, column) else {
            return Ok(None);
        };
        let payload = self.view.create_payload(&fields);
        let id = self.source.create(&payload)?;
        log::info!("created interval {}", id);
        self.load()?;
        Ok(Some(id))
    }
}
