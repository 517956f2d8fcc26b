//! Mutation and creation payloads.
//!
//! A gesture ends in a `PendingMutation` carrying only the fields that
//! changed. Creation from an empty cell uses `PrefilledFields`. Both are
//! turned into record-source payloads keyed by the configured field names.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{server_datetime, GroupKey, IntervalId, Timestamp};
use crate::sequencer::RequestToken;

/// Field names of the record source.
#[derive(Debug, Clone, Copy)]
pub struct DateFields<'a> {
    pub start: &'a str,
    pub stop: &'a str,
}

fn key_value(key: &GroupKey) -> Value {
    match key {
        GroupKey::Undefined => Value::Null,
        GroupKey::Value(v) => Value::String(v.clone()),
    }
}

/// Partial update of one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges {
    /// New start, if changed.
    pub start: Option<Timestamp>,
    /// New stop, if changed.
    pub stop: Option<Timestamp>,
    /// Changed grouping dimensions (field → new key).
    pub group_keys: BTreeMap<String, GroupKey>,
}

impl FieldChanges {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.stop.is_none() && self.group_keys.is_empty()
    }

    /// Record-source payload with datetimes in server format.
    pub fn to_payload(&self, fields: DateFields<'_>) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(start) = &self.start {
            payload.insert(fields.start.to_string(), server_datetime::format(start).into());
        }
        if let Some(stop) = &self.stop {
            payload.insert(fields.stop.to_string(), server_datetime::format(stop).into());
        }
        for (field, key) in &self.group_keys {
            payload.insert(field.clone(), key_value(key));
        }
        payload
    }
}

/// A proposed edit awaiting the record source.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    /// Edited record.
    pub interval_id: IntervalId,
    /// Start after the edit.
    pub proposed_start: Timestamp,
    /// Stop after the edit (`None` for open-ended records).
    pub proposed_stop: Option<Timestamp>,
    /// Full group path after a row change, if the row changed.
    pub proposed_group_keys: Option<Vec<GroupKey>>,
    /// Only the changed fields.
    pub changes: FieldChanges,
    /// Sequencer token of this request.
    pub token: RequestToken,
}

/// Creation defaults for a cell (create-on-click / create-on-drop).
#[derive(Debug, Clone, PartialEq)]
pub struct PrefilledFields {
    /// Cell start.
    pub start: Timestamp,
    /// Cell stop.
    pub stop: Timestamp,
    /// Group values of the target row (field → key).
    pub group_values: BTreeMap<String, GroupKey>,
}

impl PrefilledFields {
    /// Record-source payload with datetimes in server format.
    pub fn to_payload(&self, fields: DateFields<'_>) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(fields.start.to_string(), server_datetime::format(&self.start).into());
        payload.insert(fields.stop.to_string(), server_datetime::format(&self.stop).into());
        for (field, key) in &self.group_values {
            payload.insert(field.clone(), key_value(key));
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const FIELDS: DateFields<'static> = DateFields {
        start: "date_start",
        stop: "date_stop",
    };

    #[test]
    fn test_changes_payload_only_changed_fields() {
        let mut changes = FieldChanges {
            stop: Some(Utc.with_ymd_and_hms(2018, 12, 5, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        changes.group_keys.insert("user_id".into(), GroupKey::Undefined);

        let payload = changes.to_payload(FIELDS);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload["date_stop"], "2018-12-05 00:00:00");
        assert_eq!(payload["user_id"], Value::Null);
        assert!(!payload.contains_key("date_start"));
    }

    #[test]
    fn test_empty_changes() {
        assert!(FieldChanges::default().is_empty());
        assert!(FieldChanges::default().to_payload(FIELDS).is_empty());
    }

    #[test]
    fn test_prefilled_payload() {
        let mut group_values = BTreeMap::new();
        group_values.insert("project_id".to_string(), GroupKey::value("P1"));
        let fields = PrefilledFields {
            start: Utc.with_ymd_and_hms(2018, 12, 9, 23, 0, 0).unwrap(),
            stop: Utc.with_ymd_and_hms(2018, 12, 10, 23, 0, 0).unwrap(),
            group_values,
        };
        let payload = fields.to_payload(FIELDS);
        assert_eq!(payload["date_start"], "2018-12-09 23:00:00");
        assert_eq!(payload["date_stop"], "2018-12-10 23:00:00");
        assert_eq!(payload["project_id"], "P1");
    }
}
