//! Timeline grid engine for Gantt views.
//!
//! Turns a time scale, a grouping hierarchy and a set of time intervals
//! into the structures a renderer needs: columns, hierarchical rows,
//! non-overlapping levels per row, consolidated aggregate segments for
//! group rows, and proposed mutations from drag and resize gestures.
//! Rendering and record storage stay outside; records come from a
//! [`view::RecordSource`].
//!
//! # Modules
//!
//! - **`scale`**: Scales, precisions, window computation, the column grid
//!   and time-to-position mapping
//! - **`rows`**: Group paths, open/closed state, the row tree
//! - **`packing`**: Greedy level assignment of overlapping intervals
//! - **`consolidation`**: Sweep-line aggregation for group rows
//! - **`interaction`**: Hover, drag and resize state machine
//! - **`sequencer`**: Request tokens; only the latest response is applied
//! - **`view`**: Orchestration, the record source and a synchronous session
//! - **`models`**: Intervals, columns, aggregates and mutation payloads
//! - **`validation`**: Record integrity checks
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use u_gantt::config::GanttConfig;
//! use u_gantt::models::Interval;
//! use u_gantt::rows::RowPath;
//! use u_gantt::scale::{FixedClock, Scale, TimeScaleConfig};
//! use u_gantt::view::{GanttSession, InMemorySource};
//!
//! let day = |d| Utc.with_ymd_and_hms(2018, 12, d, 0, 0, 0).unwrap();
//! let source = InMemorySource::new(vec![
//!     Interval::new(1, day(10), day(12)).with_group_key("Alice"),
//!     Interval::new(2, day(11), day(14)).with_group_key("Alice"),
//! ]);
//! let config = GanttConfig::new(TimeScaleConfig::new(
//!     Scale::Month,
//!     NaiveDate::from_ymd_opt(2018, 12, 20).unwrap(),
//! ))
//! .with_group_by(["user_id"]);
//!
//! let mut session = GanttSession::with_clock(source, config, FixedClock(day(20))).unwrap();
//! session.load().unwrap();
//!
//! let layout = session.view().layout().unwrap();
//! assert_eq!(layout.grid().len(), 31);
//! let alice = layout.rows().get(&RowPath::from(["Alice"])).unwrap();
//! assert_eq!(alice.packing().unwrap().level_count(), 2);
//! ```
//!
//! # References
//!
//! - Cormen et al. (2009), "Introduction to Algorithms", Problem 16-1
//!   (interval-graph colouring)
//! - de Berg et al. (2008), "Computational Geometry", §2.1 (sweep line)

pub mod config;
pub mod consolidation;
pub mod error;
pub mod interaction;
pub mod models;
pub mod packing;
pub mod rows;
pub mod scale;
pub mod sequencer;
pub mod validation;
pub mod view;

pub use config::GanttConfig;
pub use error::{GanttError, GanttResult, SourceError};
pub use view::{GanttSession, GanttView};
