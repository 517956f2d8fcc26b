//! Serde helpers for the record source datetime format.
//!
//! Datetimes cross the collaborator boundary as naive UTC strings
//! (`2018-12-20 12:00:00`). Use with `#[serde(with = "server_datetime")]`
//! or `#[serde(with = "server_datetime::option")]`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

use super::Timestamp;

/// Wire format for datetimes.
pub const SERVER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats an instant in the server format.
pub fn format(ts: &Timestamp) -> String {
    ts.format(SERVER_FORMAT).to_string()
}

/// Parses a server-format string as a UTC instant.
pub fn parse(s: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, SERVER_FORMAT).map(|ndt| ndt.and_utc())
}

pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Same format for optional fields; `null`/`false` map to `None`.
pub mod option {
    use super::*;
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        ts: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => super::serialize(ts, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => parse(&s).map(Some).map_err(serde::de::Error::custom),
            Value::Null | Value::Bool(false) => Ok(None),
            other => Err(serde::de::Error::custom(format!(
                "expected datetime string, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_and_parse() {
        let ts = Utc.with_ymd_and_hms(2018, 12, 20, 12, 0, 0).unwrap();
        assert_eq!(format(&ts), "2018-12-20 12:00:00");
        assert_eq!(parse("2018-12-20 12:00:00").unwrap(), ts);
        assert!(parse("2018-12-20T12:00:00Z").is_err());
    }
}
