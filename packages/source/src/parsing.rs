//! Shared parsing utilities for raw flight rows.
//!
//! Raw `ArcGIS` attributes arrive loosely typed: dates may be epoch
//! milliseconds or text, numbers may be strings, and `0` stands in for a
//! missing coordinate.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Text layouts tried (in order) for naive date-times.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Parses a textual date-time. RFC 3339 strings keep their offset; naive
/// ISO and `MM/DD/YYYY` forms are read as UTC. A bare `MM/DD/YYYY` or
/// `YYYY-MM-DD` date is taken at midnight.
#[must_use]
pub fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    ["%m/%d/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Converts epoch milliseconds (as sent by `ArcGIS` date fields).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn epoch_ms_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

/// Parses a date attribute: a JSON number is epoch milliseconds, a string
/// is either all digits (epoch milliseconds) or a date-time text.
#[must_use]
pub fn parse_date_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => epoch_ms_to_datetime(n.as_f64()?),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                trimmed.parse::<f64>().ok().and_then(epoch_ms_to_datetime)
            } else {
                parse_datetime_str(trimmed)
            }
        }
        _ => None,
    }
}

/// Parses a coordinate from a JSON number or numeric string. Returns
/// `None` if missing, unparseable, non-finite or zero.
#[must_use]
pub fn parse_coordinate(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (parsed.is_finite() && parsed != 0.0).then_some(parsed)
}

/// Parses a `[lon, lat]` pair. Returns `None` if either half is missing
/// or zero.
#[must_use]
pub fn parse_lon_lat(lon: &serde_json::Value, lat: &serde_json::Value) -> Option<[f64; 2]> {
    Some([parse_coordinate(lon)?, parse_coordinate(lat)?])
}

/// Reads a scalar attribute as trimmed text. Numbers are rendered in
/// their JSON form; blank strings, nulls and containers yield `None`.
#[must_use]
pub fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_iso_with_fractional() {
        let dt = parse_datetime_str("2024-01-15T14:30:00.000").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 14:30:00 UTC");
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_datetime_str("2024-01-15T06:30:00-08:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 14:30:00 UTC");
    }

    #[test]
    fn parses_mdy_with_time() {
        let dt = parse_datetime_str("01/15/2024 14:30").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 14:30:00 UTC");
        let dt = parse_datetime_str("1/5/2024 2:30 PM").unwrap();
        assert_eq!(dt.to_string(), "2024-01-05 14:30:00 UTC");
    }

    #[test]
    fn parses_bare_date_at_midnight() {
        let dt = parse_datetime_str("01/15/2024").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 00:00:00 UTC");
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_datetime_str("not-a-date").is_none());
        assert!(parse_datetime_str("  ").is_none());
    }

    #[test]
    fn parses_epoch_ms_number_and_string() {
        let expected = "2023-01-01 08:00:00 UTC";
        assert_eq!(
            parse_date_value(&json!(1_672_560_000_000_i64)).unwrap().to_string(),
            expected
        );
        assert_eq!(
            parse_date_value(&json!("1672560000000")).unwrap().to_string(),
            expected
        );
        assert!(parse_date_value(&json!(null)).is_none());
    }

    #[test]
    fn coordinates_reject_zero_and_garbage() {
        assert_eq!(parse_coordinate(&json!(-117.08)), Some(-117.08));
        assert_eq!(parse_coordinate(&json!(" 32.64 ")), Some(32.64));
        assert!(parse_coordinate(&json!(0)).is_none());
        assert!(parse_coordinate(&json!("0.0")).is_none());
        assert!(parse_coordinate(&json!("abc")).is_none());
        assert!(parse_lon_lat(&json!(-117.08), &json!(null)).is_none());
    }

    #[test]
    fn stringifies_scalars() {
        assert_eq!(value_to_string(&json!(" 12 ")), Some("12".to_string()));
        assert_eq!(value_to_string(&json!(12.5)), Some("12.5".to_string()));
        assert!(value_to_string(&json!("")).is_none());
        assert!(value_to_string(&json!(null)).is_none());
    }
}
