//! Input validation for record sets.
//!
//! Checks structural integrity of the records handed over by the record
//! source before layout. Detects:
//! - Duplicate IDs
//! - Malformed intervals (`stop < start`)
//! - Group keys not matching the grouping arity

use crate::models::{Interval, IntervalId};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending record.
    pub interval_id: IntervalId,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two records share the same ID.
    DuplicateId,
    /// A record stops before it starts.
    MalformedInterval,
    /// A record carries more or fewer group keys than grouping dimensions.
    GroupArityMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, interval_id: IntervalId, message: impl Into<String>) -> Self {
        Self {
            kind,
            interval_id,
            message: message.into(),
        }
    }
}

/// Validates a record set.
///
/// Checks:
/// 1. No duplicate record IDs
/// 2. No record stops before it starts
/// 3. Every record has `group_arity` group keys
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_records(records: &[Interval], group_arity: usize) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for record in records {
        if !ids.insert(record.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                record.id,
                format!("Duplicate record ID: {}", record.id),
            ));
        }

        if record.is_malformed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedInterval,
                record.id,
                format!("Record {} stops before it starts", record.id),
            ));
        }

        if record.group_keys.len() != group_arity {
            errors.push(ValidationError::new(
                ValidationErrorKind::GroupArityMismatch,
                record.id,
                format!(
                    "Record {} has {} group keys, expected {}",
                    record.id,
                    record.group_keys.len(),
                    group_arity
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Drops records that cannot be laid out.
///
/// Malformed intervals and repeated IDs (first occurrence wins) are removed
/// with a warning. Arity mismatches are kept: missing keys group under
/// `Undefined`.
pub fn sanitize_records(records: Vec<Interval>, group_arity: usize) -> Vec<Interval> {
    let Err(errors) = validate_records(&records, group_arity) else {
        return records;
    };
    for e in &errors {
        match e.kind {
            ValidationErrorKind::GroupArityMismatch => log::debug!("{}", e.message),
            _ => log::warn!("dropping record: {}", e.message),
        }
    }

    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| !r.is_malformed() && seen.insert(r.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;
    use chrono::{TimeZone, Utc};

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2018, 12, day, 0, 0, 0).unwrap()
    }

    fn record(id: IntervalId, from: u32, to: u32) -> Interval {
        Interval::new(id, at(from), at(to)).with_group_key("Alice")
    }

    #[test]
    fn test_valid_records() {
        let records = vec![
            record(1, 1, 2),
            record(2, 2, 2),
            Interval::open_ended(3, at(5)).with_group_key("Bob"),
        ];
        assert!(validate_records(&records, 1).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let records = vec![record(1, 1, 2), record(1, 3, 4)];
        let errors = validate_records(&records, 1).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
    }

    #[test]
    fn test_malformed_interval() {
        let errors = validate_records(&[record(4, 5, 2)], 1).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::MalformedInterval);
        assert_eq!(errors[0].interval_id, 4);
    }

    #[test]
    fn test_group_arity_mismatch() {
        let errors = validate_records(&[record(1, 1, 2)], 2).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::GroupArityMismatch);
    }

    #[test]
    fn test_multiple_errors() {
        let records = vec![record(1, 1, 2), record(1, 5, 2)];
        let errors = validate_records(&records, 0).unwrap_err();
        // duplicate + malformed + two arity mismatches
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_sanitize_drops_unusable() {
        let records = vec![record(1, 1, 2), record(1, 3, 4), record(2, 5, 2), record(3, 1, 9)];
        let kept: Vec<IntervalId> = sanitize_records(records, 1).iter().map(|r| r.id).collect();
        assert_eq!(kept, vec![1, 3]);
    }
}
