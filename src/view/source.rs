//! Record source collaborator.
//!
//! The engine never stores records. It asks a [`RecordSource`] for the
//! records of a window, the unavailable columns, and sends partial updates
//! and creations back. Payloads are JSON objects keyed by the source's
//! field names with datetimes in server format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::SourceError;
use crate::models::{server_datetime, Column, GroupKey, Interval, IntervalId, TimeSpan, Timestamp};
use crate::rows::{GroupStructure, RowPath};
use crate::scale::Scale;

/// Record query for one view cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchQuery {
    pub scale: Scale,
    /// Visible window; the source returns records overlapping it.
    #[serde(with = "window_format")]
    pub window: TimeSpan,
    /// Grouping dimensions, outermost first.
    pub group_by: Vec<String>,
    /// Record field to read `Interval::measure` from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_field: Option<String>,
    /// Boolean record field to read `Interval::exclude_from_consolidation`
    /// from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_field: Option<String>,
}

mod window_format {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Raw {
        #[serde(with = "server_datetime")]
        start: Timestamp,
        #[serde(with = "server_datetime")]
        stop: Timestamp,
    }

    pub fn serialize<S: Serializer>(w: &TimeSpan, serializer: S) -> Result<S::Ok, S::Error> {
        Raw {
            start: w.start,
            stop: w.stop,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeSpan, D::Error> {
        let raw = Raw::deserialize(deserializer)?;
        Ok(TimeSpan::new(raw.start, raw.stop))
    }
}

/// Records plus the grouping hierarchy (including empty groups).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub records: Vec<Interval>,
    #[serde(default)]
    pub groups: GroupStructure,
}

impl FetchResponse {
    /// Leaf rows the response will produce.
    pub fn leaf_paths(&self, arity: usize) -> Vec<RowPath> {
        let mut seen = BTreeSet::new();
        let mut paths = Vec::new();
        let reported = self
            .groups
            .entries()
            .iter()
            .map(|e| e.path.clone())
            .filter(|p| p.depth() == arity);
        let from_records = self.records.iter().map(|r| RowPath::new(r.group_path(arity)));
        for path in reported.chain(from_records) {
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
        paths
    }
}

/// Unavailable columns (column index → unavailable).
pub type UnavailabilityMap = BTreeMap<usize, bool>;

/// Unavailability for one view cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unavailability {
    /// Marks applied to the columns.
    pub global: UnavailabilityMap,
    /// Marks per leaf row.
    pub per_row: HashMap<RowPath, UnavailabilityMap>,
}

/// Everything a fetch produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPayload {
    pub response: FetchResponse,
    pub unavailability: Unavailability,
}

impl From<FetchResponse> for FetchPayload {
    fn from(response: FetchResponse) -> Self {
        Self {
            response,
            unavailability: Unavailability::default(),
        }
    }
}

/// The record source.
pub trait RecordSource {
    /// Records overlapping the query window, with the group structure.
    fn fetch_records(&mut self, query: &FetchQuery) -> Result<FetchResponse, SourceError>;

    /// Unavailable columns, globally (`row == None`) or for one row.
    ///
    /// Missing entries mean available.
    fn fetch_unavailability(
        &mut self,
        columns: &[Column],
        row: Option<&RowPath>,
    ) -> Result<UnavailabilityMap, SourceError>;

    /// Partial update of one record; only changed fields are present.
    fn mutate(&mut self, id: IntervalId, fields: &Map<String, Value>) -> Result<(), SourceError>;

    /// Creates a record from prefilled fields.
    fn create(&mut self, fields: &Map<String, Value>) -> Result<IntervalId, SourceError>;
}

/// Record source backed by a `Vec`.
///
/// Marks columns starting on the configured weekdays unavailable and can be
/// told to fail the next fetch or mutation. Extra record fields set with
/// [`with_record_field`](Self::with_record_field) fill the measure and the
/// exclusion flag when a query names them.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Interval>,
    fields: HashMap<IntervalId, Map<String, Value>>,
    /// Groups reported even without records.
    empty_groups: Vec<RowPath>,
    group_fields: Vec<String>,
    date_start_field: String,
    date_stop_field: String,
    unavailable_weekdays: HashSet<chrono::Weekday>,
    row_unavailable: HashMap<RowPath, BTreeSet<usize>>,
    fail_next_fetch: Option<String>,
    reject_next_mutation: Option<String>,
    fetches: usize,
    mutations: usize,
}

impl InMemorySource {
    pub fn new(records: Vec<Interval>) -> Self {
        Self {
            records,
            date_start_field: "date_start".to_string(),
            date_stop_field: "date_stop".to_string(),
            ..Default::default()
        }
    }

    /// Field names used to decode grouping changes.
    pub fn with_group_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Stores a named field on one record.
    pub fn with_record_field(
        mut self,
        id: IntervalId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.fields.entry(id).or_default().insert(name.into(), value.into());
        self
    }

    pub fn with_empty_group(mut self, path: impl Into<RowPath>) -> Self {
        self.empty_groups.push(path.into());
        self
    }

    pub fn with_unavailable_weekday(mut self, day: chrono::Weekday) -> Self {
        self.unavailable_weekdays.insert(day);
        self
    }

    pub fn with_row_unavailable(mut self, row: impl Into<RowPath>, columns: &[usize]) -> Self {
        self.row_unavailable
            .entry(row.into())
            .or_default()
            .extend(columns.iter().copied());
        self
    }

    pub fn fail_next_fetch(&mut self, reason: impl Into<String>) {
        self.fail_next_fetch = Some(reason.into());
    }

    pub fn reject_next_mutation(&mut self, reason: impl Into<String>) {
        self.reject_next_mutation = Some(reason.into());
    }

    pub fn records(&self) -> &[Interval] {
        &self.records
    }

    pub fn record(&self, id: IntervalId) -> Option<&Interval> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Number of successful record fetches.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Number of accepted mutations.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Fills measure and exclusion from the fields the query names.
    fn resolve_fields(&self, mut record: Interval, query: &FetchQuery) -> Interval {
        let Some(fields) = self.fields.get(&record.id) else {
            return record;
        };
        let measure = query.measure_field.as_deref().and_then(|n| fields.get(n));
        if let Some(measure) = measure.and_then(Value::as_f64) {
            record.measure = Some(measure);
        }
        let excluded = query.exclude_field.as_deref().and_then(|n| fields.get(n));
        if let Some(excluded) = excluded.and_then(Value::as_bool) {
            record.exclude_from_consolidation = excluded;
        }
        record
    }

    fn decode_time(
        &self,
        fields: &Map<String, Value>,
        name: &str,
    ) -> Result<Option<Timestamp>, SourceError> {
        match fields.get(name) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
            Some(Value::String(s)) => server_datetime::parse(s)
                .map(Some)
                .map_err(|e| SourceError::Rejected(format!("{name}: {e}"))),
            Some(other) => Err(SourceError::Rejected(format!("{name}: unexpected value {other}"))),
        }
    }

    fn apply_groups(&self, record: &mut Interval, fields: &Map<String, Value>) {
        for (i, field) in self.group_fields.iter().enumerate() {
            let Some(value) = fields.get(field) else {
                continue;
            };
            let key = match value {
                Value::String(s) => GroupKey::value(s.clone()),
                Value::Null => GroupKey::Undefined,
                other => GroupKey::value(other.to_string()),
            };
            if record.group_keys.len() <= i {
                record.group_keys.resize(i + 1, GroupKey::Undefined);
            }
            record.group_keys[i] = key;
        }
    }
}

impl RecordSource for InMemorySource {
    fn fetch_records(&mut self, query: &FetchQuery) -> Result<FetchResponse, SourceError> {
        if let Some(reason) = self.fail_next_fetch.take() {
            return Err(SourceError::Unavailable(reason));
        }
        self.fetches += 1;
        let arity = query.group_by.len();
        let records: Vec<Interval> = self
            .records
            .iter()
            .filter(|r| r.clamp_to(&query.window).is_some())
            .map(|r| self.resolve_fields(r.clone(), query))
            .collect();
        let mut groups = GroupStructure::from_records(&records, arity);
        if arity > 0 {
            for path in &self.empty_groups {
                if !groups.entries().iter().any(|e| &e.path == path) {
                    groups = groups.with_group(path.clone(), 0);
                }
            }
        }
        Ok(FetchResponse { records, groups })
    }

    fn fetch_unavailability(
        &mut self,
        columns: &[Column],
        row: Option<&RowPath>,
    ) -> Result<UnavailabilityMap, SourceError> {
        use chrono::Datelike;

        let mut marks: UnavailabilityMap = columns
            .iter()
            .filter(|c| self.unavailable_weekdays.contains(&c.start.weekday()))
            .map(|c| (c.index, true))
            .collect();
        if let Some(extra) = row.and_then(|r| self.row_unavailable.get(r)) {
            marks.extend(extra.iter().map(|&i| (i, true)));
        }
        Ok(marks)
    }

    fn mutate(&mut self, id: IntervalId, fields: &Map<String, Value>) -> Result<(), SourceError> {
        if let Some(reason) = self.reject_next_mutation.take() {
            return Err(SourceError::Rejected(reason));
        }
        let start = self.decode_time(fields, &self.date_start_field)?;
        let stop = self.decode_time(fields, &self.date_stop_field)?;
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SourceError::Rejected(format!("record {id} does not exist")))?;

        let mut record = self.records[index].clone();
        if let Some(start) = start {
            record.start = start;
        }
        if stop.is_some() {
            record.stop = stop;
        }
        self.apply_groups(&mut record, fields);
        if record.is_malformed() {
            return Err(SourceError::Rejected(format!("record {id} would stop before it starts")));
        }
        self.records[index] = record;
        self.mutations += 1;
        Ok(())
    }

    fn create(&mut self, fields: &Map<String, Value>) -> Result<IntervalId, SourceError> {
        let start = self
            .decode_time(fields, &self.date_start_field)?
            .ok_or_else(|| SourceError::Rejected("missing start".to_string()))?;
        let stop = self.decode_time(fields, &self.date_stop_field)?;
        let id = self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut record = Interval::open_ended(id, start);
        record.stop = stop;
        self.apply_groups(&mut record, fields);
        self.records.push(record);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc, Weekday};

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2018, 12, day, 0, 0, 0).unwrap()
    }

    fn query(group_by: &[&str]) -> FetchQuery {
        FetchQuery {
            scale: Scale::Month,
            window: TimeSpan::new(at(1), Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()),
            group_by: group_by.iter().map(|s| s.to_string()).collect(),
            measure_field: None,
            exclude_field: None,
        }
    }

    fn source() -> InMemorySource {
        InMemorySource::new(vec![
            Interval::new(1, at(2), at(4)).with_group_key("Alice"),
            Interval::new(2, at(1) - chrono::TimeDelta::days(9), at(1) - chrono::TimeDelta::days(2))
                .with_group_key("Bob"),
        ])
        .with_group_fields(["user_id"])
        .with_empty_group(["Carol"])
    }

    #[test]
    fn test_fetch_filters_window_and_reports_empty_groups() {
        let mut src = source();
        let response = src.fetch_records(&query(&["user_id"])).unwrap();
        assert_eq!(response.records.len(), 1);
        let paths: Vec<RowPath> = response
            .groups
            .entries()
            .iter()
            .map(|e| e.path.clone())
            .collect();
        assert_eq!(paths, vec![RowPath::from(["Alice"]), RowPath::from(["Carol"])]);
        assert_eq!(response.leaf_paths(1).len(), 2);
        assert_eq!(src.fetch_count(), 1);
    }

    #[test]
    fn test_measure_and_exclude_fields() {
        let mut src = source()
            .with_record_field(1, "allocated_hours", 6.5)
            .with_record_field(1, "internal", true);
        let plain = src.fetch_records(&query(&["user_id"])).unwrap();
        assert_eq!(plain.records[0].measure, None);
        assert!(!plain.records[0].exclude_from_consolidation);

        let mut q = query(&["user_id"]);
        q.measure_field = Some("allocated_hours".to_string());
        q.exclude_field = Some("internal".to_string());
        let resolved = src.fetch_records(&q).unwrap();
        assert_eq!(resolved.records[0].measure, Some(6.5));
        assert!(resolved.records[0].exclude_from_consolidation);

        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["measure_field"], "allocated_hours");
    }

    #[test]
    fn test_fetch_failure_once() {
        let mut src = source();
        src.fail_next_fetch("offline");
        assert!(matches!(
            src.fetch_records(&query(&[])),
            Err(SourceError::Unavailable(_))
        ));
        assert!(src.fetch_records(&query(&[])).is_ok());
    }

    #[test]
    fn test_mutate_partial_fields() {
        let mut src = source();
        let mut fields = Map::new();
        fields.insert("date_stop".to_string(), Value::String("2018-12-06 00:00:00".to_string()));
        fields.insert("user_id".to_string(), Value::String("Bob".to_string()));
        src.mutate(1, &fields).unwrap();

        let record = src.record(1).unwrap();
        assert_eq!(record.start, at(2));
        assert_eq!(record.stop, Some(at(6)));
        assert_eq!(record.group_keys, vec![GroupKey::value("Bob")]);
        assert_eq!(src.mutation_count(), 1);
    }

    #[test]
    fn test_mutate_rejections() {
        let mut src = source();
        src.reject_next_mutation("conflict");
        assert_eq!(
            src.mutate(1, &Map::new()),
            Err(SourceError::Rejected("conflict".to_string()))
        );
        assert!(src.mutate(99, &Map::new()).is_err());

        let mut fields = Map::new();
        fields.insert("date_start".to_string(), Value::String("2018-12-20 00:00:00".to_string()));
        assert!(src.mutate(1, &fields).is_err());
        assert_eq!(src.record(1).unwrap().start, at(2));
    }

    #[test]
    fn test_create() {
        let mut src = source();
        let mut fields = Map::new();
        fields.insert("date_start".to_string(), Value::String("2018-12-10 00:00:00".to_string()));
        fields.insert("date_stop".to_string(), Value::String("2018-12-11 00:00:00".to_string()));
        fields.insert("user_id".to_string(), Value::Null);
        let id = src.create(&fields).unwrap();
        assert_eq!(id, 3);
        assert_eq!(src.record(3).unwrap().group_keys, vec![GroupKey::Undefined]);
    }

    #[test]
    fn test_unavailability() {
        let mut src = source()
            .with_unavailable_weekday(Weekday::Sat)
            .with_row_unavailable(["Alice"], &[2]);
        let columns: Vec<Column> = (0..7)
            .map(|i| Column::new(i, at(1 + i as u32), at(2 + i as u32)))
            .collect();
        // 2018-12-01 is a Saturday
        let global = src.fetch_unavailability(&columns, None).unwrap();
        assert_eq!(global.keys().copied().collect::<Vec<_>>(), vec![0]);
        let alice = src
            .fetch_unavailability(&columns, Some(&RowPath::from(["Alice"])))
            .unwrap();
        assert_eq!(alice.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_query_serializes_server_format() {
        let json = serde_json::to_value(query(&["user_id"])).unwrap();
        assert_eq!(json["window"]["start"], "2018-12-01 00:00:00");
        assert_eq!(json["scale"], "month");
    }
}
