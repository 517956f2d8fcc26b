//! Error types.
//!
//! Every failure in the engine is recoverable: a rejected mutation reverts
//! the view, a failed fetch keeps the last applied layout. These types only
//! describe what went wrong so the host can surface it.

use crate::models::IntervalId;
use crate::scale::{Precision, Scale};

/// Result alias for engine operations.
pub type GanttResult<T> = Result<T, GanttError>;

/// Engine error.
#[derive(Debug, thiserror::Error)]
pub enum GanttError {
    /// The precision is not offered for the scale.
    #[error("precision {precision} is not available for the {scale} scale")]
    InvalidPrecision { scale: Scale, precision: Precision },

    /// Calendar arithmetic left the representable date range.
    #[error("date out of range")]
    DateOutOfRange,

    /// An interval stops before it starts.
    #[error("interval {id} stops before it starts")]
    MalformedInterval { id: IntervalId },

    /// No interval with this id is loaded.
    #[error("unknown interval {id}")]
    UnknownInterval { id: IntervalId },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The record source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Configuration document could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by the record source collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source refused the mutation (e.g. a concurrent edit conflict).
    #[error("mutation rejected: {0}")]
    Rejected(String),

    /// The source could not be reached or the read failed.
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}
