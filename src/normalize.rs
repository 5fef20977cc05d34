//! Conversion of raw task records into typed [`Task`]s.
//!
//! Raw records are whatever JSON objects the task source returned. Normalisation
//! is all-or-nothing: the first bad record aborts the batch, so a view never
//! renders a half-converted table.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::DashError;
use crate::task::Task;

const START_FIELD: &str = "start_date";
const DUE_FIELD: &str = "due_date";

/// Date-time layouts tried before the date-only ones.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Shortest digit string read as epoch milliseconds (1973-03-03 onwards).
const MIN_EPOCH_MS_DIGITS: usize = 12;

/// Parsed dates outside these years are treated as corrupt.
const YEAR_WINDOW: std::ops::RangeInclusive<i32> = 1900..=2200;

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%A, %d %B %Y",
];

/// Normalise a batch of raw records, preserving source order.
pub fn normalize_tasks(records: &[Value]) -> Result<Vec<Task>, DashError> {
    let tasks = records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for (index, task) in tasks.iter().enumerate() {
        if !seen.insert(task.id.as_str()) {
            return Err(DashError::MalformedRecord {
                index,
                reason: format!("duplicate id {:?}", task.id),
            });
        }
    }

    tracing::debug!(target: "sdash.normalize", records = records.len(), "normalised task batch");
    Ok(tasks)
}

/// Normalise one raw record. `index` is its position in the batch, for errors.
pub fn normalize_record(index: usize, record: &Value) -> Result<Task, DashError> {
    let malformed = |reason: String| DashError::MalformedRecord { index, reason };

    let obj = record
        .as_object()
        .ok_or_else(|| malformed(format!("expected an object, got {}", json_type(record))))?;

    let id = required_str(obj, "id").map_err(malformed)?;
    let name = required_str(obj, "name").map_err(malformed)?;
    let status = obj
        .get("status")
        .and_then(Value::as_object)
        .and_then(|s| s.get("status"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing status.status label".to_string()))?;

    let start = parse_date_field(obj.get(START_FIELD), id, START_FIELD)?;
    let due = parse_date_field(obj.get(DUE_FIELD), id, DUE_FIELD)?;

    Ok(Task::new(id, name, status, start, due))
}

fn required_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(format!("field {key:?} must be a string, got {}", json_type(other))),
        None => Err(format!("missing field {key:?}")),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse an optional date field. Absent, null and blank values are `None`.
fn parse_date_field(
    value: Option<&Value>,
    id: &str,
    field: &'static str,
) -> Result<Option<NaiveDate>, DashError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    parse_flexible_date(&raw).map(Some).ok_or_else(|| DashError::DateParse {
        id: id.to_string(),
        field,
        value: raw,
    })
}

/// Parse a date written in any of the layouts the task source is known to emit.
///
/// Supports:
/// - Unix epoch milliseconds of at least 12 digits, e.g. "1704067200000" (UTC day)
/// - compact "YYYYMMDD"
/// - RFC 3339 timestamps (day in the timestamp's own offset)
/// - "YYYY-MM-DD", "YYYY/MM/DD", "MM/DD/YYYY", optionally with a time of day
/// - "3 Jan 2024", "Jan 3, 2024", "January 3 2024"
///
/// Results outside the years 1900..=2200 are rejected.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    parse_any_layout(s.trim()).filter(|d| YEAR_WINDOW.contains(&d.year()))
}

fn parse_any_layout(s: &str) -> Option<NaiveDate> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return match s.len() {
            8 => NaiveDate::parse_from_str(s, "%Y%m%d").ok(),
            n if n >= MIN_EPOCH_MS_DIGITS => s
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.date_naive()),
            _ => None,
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case("2024-01-03", d(2024, 1, 3))]
    #[case("  2024-01-03 ", d(2024, 1, 3))]
    #[case("2024/01/03", d(2024, 1, 3))]
    #[case("01/03/2024", d(2024, 1, 3))]
    #[case("20240103", d(2024, 1, 3))]
    #[case("2024-01-03T23:59:00", d(2024, 1, 3))]
    #[case("2024-01-03 08:15", d(2024, 1, 3))]
    #[case("2024-01-03T10:00:00+02:00", d(2024, 1, 3))]
    #[case("2024-01-03T23:30:00-05:00", d(2024, 1, 3))]
    #[case("3 Jan 2024", d(2024, 1, 3))]
    #[case("Jan 3, 2024", d(2024, 1, 3))]
    #[case("January 3 2024", d(2024, 1, 3))]
    #[case("1704283200000", d(2024, 1, 3))]
    #[case("3 January 2024", d(2024, 1, 3))]
    #[case("January 3, 2024", d(2024, 1, 3))]
    fn test_parse_flexible_date_accepts(#[case] input: &str, #[case] expected: NaiveDate) {
        assert_eq!(parse_flexible_date(input), Some(expected));
    }

    #[rstest]
    #[case("not-a-date")]
    #[case("2024-13-40")]
    #[case("tomorrow-ish")]
    #[case("true")]
    #[case("2024")]
    #[case("7")]
    #[case("123")]
    #[case("1704283200")]
    #[case("-8000000000000000")]
    #[case("8000000000000000")]
    #[case("0000-01-01")]
    fn test_parse_flexible_date_rejects(#[case] input: &str) {
        assert_eq!(parse_flexible_date(input), None);
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_tasks(&[]).unwrap(), Vec::<Task>::new());
    }

    #[test]
    fn test_normalize_preserves_order_and_fields() {
        let records = vec![
            json!({
                "id": "b2",
                "name": "Second",
                "status": {"status": "In Progress", "color": "#4194f6"},
                "start_date": "1704283200000",
                "due_date": null
            }),
            json!({
                "id": "a1",
                "name": "First",
                "status": {"status": "done"},
                "start_date": "",
                "due_date": "2024-01-01"
            }),
        ];

        let tasks = normalize_tasks(&records).unwrap();
        assert_eq!(
            tasks,
            vec![
                Task::new("b2", "Second", "In Progress", Some(d(2024, 1, 3)), None),
                Task::new("a1", "First", "done", None, Some(d(2024, 1, 1))),
            ]
        );
        assert_eq!(tasks[0].url, "https://app.clickup.com/t/b2");
        assert_eq!(tasks[0].status_key(), "in progress");
    }

    #[test]
    fn test_short_number_is_date_error() {
        let records = vec![
            json!({"id": "a", "name": "A", "status": {"status": "todo"}, "due_date": "2024-01-03"}),
            json!({"id": "b", "name": "B", "status": {"status": "todo"}, "due_date": "2024"}),
        ];
        let err = normalize_tasks(&records).unwrap_err();
        assert!(matches!(err, DashError::DateParse { ref id, field: "due_date", .. } if id == "b"));
    }

    #[test]
    fn test_numeric_epoch_is_accepted() {
        let records = vec![json!({
            "id": "n", "name": "N", "status": {"status": "todo"}, "due_date": 1704283200000_i64
        })];
        let tasks = normalize_tasks(&records).unwrap();
        assert_eq!(tasks[0].due, Some(d(2024, 1, 3)));
    }

    #[test]
    fn test_unparseable_date_aborts_batch() {
        let records = vec![
            json!({"id": "ok", "name": "fine", "status": {"status": "todo"}}),
            json!({"id": "bad", "name": "broken", "status": {"status": "todo"}, "due_date": "not-a-date"}),
        ];
        match normalize_tasks(&records) {
            Err(DashError::DateParse { id, field, value }) => {
                assert_eq!(id, "bad");
                assert_eq!(field, "due_date");
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected DateParse, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let records = vec![json!({"id": "x", "status": {"status": "todo"}})];
        let err = normalize_tasks(&records).unwrap_err();
        assert!(matches!(err, DashError::MalformedRecord { index: 0, ref reason } if reason.contains("name")));
    }

    #[test]
    fn test_non_string_id_is_malformed() {
        let records = vec![json!({"id": 42, "name": "x", "status": {"status": "todo"}})];
        let err = normalize_tasks(&records).unwrap_err();
        assert!(matches!(err, DashError::MalformedRecord { ref reason, .. } if reason.contains("number")));
    }

    #[test]
    fn test_missing_status_object_is_malformed() {
        let records = vec![json!({"id": "x", "name": "x", "status": "todo"})];
        assert!(matches!(
            normalize_tasks(&records),
            Err(DashError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_non_object_record_is_malformed() {
        let records = vec![json!(["id", "name"])];
        let err = normalize_tasks(&records).unwrap_err();
        assert!(matches!(err, DashError::MalformedRecord { ref reason, .. } if reason.contains("array")));
    }

    #[test]
    fn test_duplicate_id_is_malformed() {
        let records = vec![
            json!({"id": "x", "name": "a", "status": {"status": "todo"}}),
            json!({"id": "x", "name": "b", "status": {"status": "done"}}),
        ];
        let err = normalize_tasks(&records).unwrap_err();
        assert!(matches!(err, DashError::MalformedRecord { index: 1, .. }));
    }
}
