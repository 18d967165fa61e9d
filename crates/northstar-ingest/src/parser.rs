//! Row-level parsing for the two supported input formats

use chrono::{DateTime, NaiveDateTime, Utc};
use northstar_core::UtcDateTime;
use serde::Deserialize;
use thiserror::Error;

/// One successfully parsed input row
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    pub user_id: i64,
    pub event_name: String,
    pub event_timestamp: UtcDateTime,
    pub platform: Option<String>,
}

#[derive(Debug, Error)]
pub enum ParseRowError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("invalid user_id '{0}'")]
    InvalidUserId(String),
    #[error("empty event_name")]
    EmptyEventName,
    #[error("unparseable timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Header of a CSV input file, mapping the required columns to positions.
/// Column order in the file is free; all four names must be present.
#[derive(Debug)]
pub struct CsvHeader {
    user_id: usize,
    event_name: usize,
    event_timestamp: usize,
    platform: usize,
}

impl CsvHeader {
    pub fn parse(line: &str) -> Result<Self, ParseRowError> {
        let columns: Vec<&str> = line.split(',').map(str::trim).collect();
        let position = |name: &'static str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or(ParseRowError::MissingField(name))
        };
        Ok(Self {
            user_id: position("user_id")?,
            event_name: position("event_name")?,
            event_timestamp: position("event_timestamp")?,
            platform: position("platform")?,
        })
    }

    /// Parse one data row. The schema is four plain columns, so a simple
    /// comma split suffices; quoted fields are not supported.
    pub fn parse_row(&self, line: &str) -> Result<ParsedEvent, ParseRowError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize, name: &'static str| {
            fields
                .get(idx)
                .copied()
                .ok_or(ParseRowError::MissingField(name))
        };

        let user_id_raw = field(self.user_id, "user_id")?;
        let user_id = user_id_raw
            .parse::<i64>()
            .map_err(|_| ParseRowError::InvalidUserId(user_id_raw.to_string()))?;

        let event_name = field(self.event_name, "event_name")?;
        if event_name.is_empty() {
            return Err(ParseRowError::EmptyEventName);
        }

        let event_timestamp = parse_timestamp(field(self.event_timestamp, "event_timestamp")?)?;

        let platform = match field(self.platform, "platform") {
            Ok(p) if !p.is_empty() => Some(p.to_string()),
            _ => None,
        };

        Ok(ParsedEvent {
            user_id,
            event_name: event_name.to_string(),
            event_timestamp,
            platform,
        })
    }
}

#[derive(Debug, Deserialize)]
struct JsonRow {
    user_id: i64,
    event_name: String,
    event_timestamp: String,
    #[serde(default)]
    platform: Option<String>,
}

/// Parse one JSON-lines row with the same field names as the CSV header
pub fn parse_json_row(line: &str) -> Result<ParsedEvent, ParseRowError> {
    let row: JsonRow = serde_json::from_str(line)?;
    if row.event_name.trim().is_empty() {
        return Err(ParseRowError::EmptyEventName);
    }
    let platform = row
        .platform
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    Ok(ParsedEvent {
        user_id: row.user_id,
        event_name: row.event_name.trim().to_string(),
        event_timestamp: parse_timestamp(&row.event_timestamp)?,
        platform,
    })
}

/// Accepts RFC 3339 (`2023-01-15T14:30:00Z`, with or without offset) or a
/// naive `2023-01-15 14:30:00`, which is assumed UTC.
pub fn parse_timestamp(raw: &str) -> Result<UtcDateTime, ParseRowError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(ParseRowError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn header_accepts_any_column_order() {
        let header = CsvHeader::parse("platform,user_id,event_timestamp,event_name").unwrap();
        let row = header
            .parse_row("ios,42,2023-01-15 10:00:00,app_install")
            .unwrap();
        assert_eq!(row.user_id, 42);
        assert_eq!(row.event_name, "app_install");
        assert_eq!(row.platform.as_deref(), Some("ios"));
    }

    #[test]
    fn header_rejects_missing_column() {
        let err = CsvHeader::parse("user_id,event_name,event_timestamp").unwrap_err();
        assert!(matches!(err, ParseRowError::MissingField("platform")));
    }

    #[test]
    fn empty_platform_becomes_null() {
        let header = CsvHeader::parse("user_id,event_name,event_timestamp,platform").unwrap();
        let row = header.parse_row("7,view_item,2023-01-15T10:00:00Z,").unwrap();
        assert_eq!(row.platform, None);
    }

    #[test]
    fn bad_user_id_is_reported() {
        let header = CsvHeader::parse("user_id,event_name,event_timestamp,platform").unwrap();
        let err = header
            .parse_row("abc,view_item,2023-01-15T10:00:00Z,ios")
            .unwrap_err();
        assert!(matches!(err, ParseRowError::InvalidUserId(_)));
    }

    #[test]
    fn timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 15, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2023-01-15T14:30:00Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2023-01-15T15:30:00+01:00").unwrap(),
            expected
        );
        assert_eq!(parse_timestamp("2023-01-15 14:30:00").unwrap(), expected);
        assert!(parse_timestamp("15/01/2023").is_err());
    }

    #[test]
    fn json_row_parses_with_and_without_platform() {
        let row = parse_json_row(
            r#"{"user_id":3,"event_name":"purchase","event_timestamp":"2023-01-15T10:00:00Z","platform":"android"}"#,
        )
        .unwrap();
        assert_eq!(row.platform.as_deref(), Some("android"));

        let row = parse_json_row(
            r#"{"user_id":3,"event_name":"purchase","event_timestamp":"2023-01-15T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(row.platform, None);
    }
}
