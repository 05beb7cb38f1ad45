//! Flight records with their derived lookup values precomputed.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone as _, Utc};
use drone_map_flight_models::{DurationBucket, FlightRecord, TimestampMs};
use drone_map_reason::canonicalize;

/// A [`FlightRecord`] plus the values every derivation keys on, computed
/// once when the dataset is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    record: FlightRecord,
    timestamp_ms: TimestampMs,
    canonical_reason: String,
    day: NaiveDate,
    duration_bucket: DurationBucket,
}

impl IndexedRecord {
    /// Indexes a record, resolving its calendar day in `offset` (or the
    /// host's local zone when `None`).
    #[must_use]
    pub fn new(record: FlightRecord, offset: Option<FixedOffset>) -> Self {
        let timestamp_ms = record.timestamp_ms();
        let canonical_reason = canonicalize(&record.reason);
        let day = calendar_day(record.date, offset);
        let duration_bucket = record.duration_bucket();
        Self {
            record,
            timestamp_ms,
            canonical_reason,
            day,
            duration_bucket,
        }
    }

    /// The underlying record.
    #[must_use]
    pub const fn record(&self) -> &FlightRecord {
        &self.record
    }

    /// Flight date as epoch milliseconds.
    #[must_use]
    pub const fn timestamp_ms(&self) -> TimestampMs {
        self.timestamp_ms
    }

    /// Canonical reason label (may be empty).
    #[must_use]
    pub fn canonical_reason(&self) -> &str {
        &self.canonical_reason
    }

    /// Calendar day of the flight.
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// Duration band of the flight.
    #[must_use]
    pub const fn duration_bucket(&self) -> DurationBucket {
        self.duration_bucket
    }

    /// Neighborhood facet label.
    #[must_use]
    pub fn neighborhood_label(&self) -> &str {
        self.record.neighborhood_label()
    }

    /// District facet label.
    #[must_use]
    pub fn district_label(&self) -> &str {
        self.record.district_label()
    }
}

/// Calendar day of `date`, with midnight boundaries in `offset` or local
/// time.
#[must_use]
pub fn calendar_day(date: DateTime<Utc>, offset: Option<FixedOffset>) -> NaiveDate {
    offset.map_or_else(
        || date.with_timezone(&Local).date_naive(),
        |offset| date.with_timezone(&offset).date_naive(),
    )
}

/// Calendar day of an epoch-millisecond timestamp. Timestamps chrono
/// cannot represent fall back to the epoch day.
#[must_use]
pub fn calendar_day_of_ms(ts: TimestampMs, offset: Option<FixedOffset>) -> NaiveDate {
    let date = DateTime::from_timestamp_millis(ts).unwrap_or_default();
    calendar_day(date, offset)
}

/// First millisecond of `day` with midnight in `offset` or local time.
/// `None` if that midnight does not exist locally.
#[must_use]
pub fn day_start_ms(day: NaiveDate, offset: Option<FixedOffset>) -> Option<TimestampMs> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    let start = match offset {
        Some(offset) => offset.from_local_datetime(&midnight).single()?,
        None => Local.from_local_datetime(&midnight).earliest()?.fixed_offset(),
    };
    Some(start.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_boundary_follows_offset() {
        let late_evening_pacific = Utc.with_ymd_and_hms(2023, 1, 2, 6, 30, 0).unwrap();
        let pacific = FixedOffset::west_opt(8 * 3600);
        let utc = FixedOffset::east_opt(0);
        assert_eq!(
            calendar_day(late_evening_pacific, pacific),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
        assert_eq!(
            calendar_day(late_evening_pacific, utc),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
        );
    }

    #[test]
    fn day_start_uses_offset_midnight() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let pacific = FixedOffset::west_opt(8 * 3600);
        let start = day_start_ms(day, pacific).unwrap();
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2023, 1, 5, 8, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(calendar_day_of_ms(start, pacific), day);
        assert_eq!(calendar_day_of_ms(start - 1, pacific), day.pred_opt().unwrap());
    }

    #[test]
    fn indexes_canonical_reason() {
        let record = FlightRecord {
            date: Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap(),
            case_number: "1".to_string(),
            duration: Some("70".to_string()),
            reason: "person with gun ".to_string(),
            location: String::new(),
            coordinates: Some([-117.0, 32.6]),
            neighborhood: None,
            district: None,
        };
        let indexed = IndexedRecord::new(record, FixedOffset::east_opt(0));
        assert_eq!(indexed.canonical_reason(), "Person with weapon");
        assert_eq!(indexed.duration_bucket(), DurationBucket::Long);
        assert_eq!(indexed.day(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }
}
