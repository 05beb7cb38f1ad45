#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Drone flight record types shared across the drone map workspace.
//!
//! A [`FlightRecord`] is one row of the police department's published
//! drone flight log. Records are immutable once loaded; everything the
//! dashboard shows is derived from them plus UI state expressed in terms
//! of [`TimeRange`], [`FacetKind`] and [`DurationBucket`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Milliseconds since the Unix epoch.
pub type TimestampMs = i64;

/// Facet label used for records without a neighborhood.
pub const UNKNOWN_NEIGHBORHOOD: &str = "Unknown";

/// Facet label used for records without a district.
pub const UNASSIGNED_DISTRICT: &str = "Unassigned";

/// A single drone flight from the published flight log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    /// When the flight took place.
    pub date: DateTime<Utc>,
    /// Case or incident number the flight was attached to.
    pub case_number: String,
    /// Flight duration in minutes, kept in the source's string form.
    /// Missing or non-numeric values count as zero.
    #[serde(default)]
    pub duration: Option<String>,
    /// Free-text reason the flight was dispatched.
    #[serde(default)]
    pub reason: String,
    /// Free-text location (usually a block address or intersection).
    #[serde(default)]
    pub location: String,
    /// `[longitude, latitude]` in WGS84.
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,
    /// Neighborhood name, if the source attributed one.
    #[serde(default)]
    pub neighborhood: Option<String>,
    /// Police district / beat identifier, if present.
    #[serde(default)]
    pub district: Option<String>,
}

impl FlightRecord {
    /// Returns the flight date as epoch milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> TimestampMs {
        self.date.timestamp_millis()
    }

    /// Parses [`Self::duration`] into minutes.
    ///
    /// Missing, empty, negative and unparseable values all yield `0.0`.
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        self.duration
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(0.0)
    }

    /// Returns the duration band this flight falls into.
    #[must_use]
    pub fn duration_bucket(&self) -> DurationBucket {
        DurationBucket::from_minutes(self.duration_minutes())
    }

    /// Returns `true` when the record carries a usable coordinate pair.
    ///
    /// Zero coordinates are treated as missing, as many exports use
    /// `0,0` as a null placeholder.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.coordinates.is_some_and(|[lon, lat]| {
            lon.is_finite()
                && lat.is_finite()
                && lon != 0.0
                && lat != 0.0
                && (-180.0..=180.0).contains(&lon)
                && (-90.0..=90.0).contains(&lat)
        })
    }

    /// Neighborhood facet label; blank or missing names become
    /// [`UNKNOWN_NEIGHBORHOOD`].
    #[must_use]
    pub fn neighborhood_label(&self) -> &str {
        non_blank(self.neighborhood.as_deref()).unwrap_or(UNKNOWN_NEIGHBORHOOD)
    }

    /// District facet label; blank or missing ids become
    /// [`UNASSIGNED_DISTRICT`].
    #[must_use]
    pub fn district_label(&self) -> &str {
        non_blank(self.district.as_deref()).unwrap_or(UNASSIGNED_DISTRICT)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Flight duration bands used by the duration facet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DurationBucket {
    /// Up to and including 15 minutes.
    Short,
    /// More than 15 and up to 60 minutes.
    Medium,
    /// More than 60 minutes.
    Long,
}

impl DurationBucket {
    /// Upper bound (inclusive) of [`Self::Short`], in minutes.
    pub const SHORT_MAX_MINUTES: f64 = 15.0;
    /// Upper bound (inclusive) of [`Self::Medium`], in minutes.
    pub const MEDIUM_MAX_MINUTES: f64 = 60.0;

    /// Classifies a duration in minutes.
    #[must_use]
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes <= Self::SHORT_MAX_MINUTES {
            Self::Short
        } else if minutes <= Self::MEDIUM_MAX_MINUTES {
            Self::Medium
        } else {
            Self::Long
        }
    }

    /// Human-readable label for legends and facet lists.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Short => "15 min or less",
            Self::Medium => "15 to 60 min",
            Self::Long => "Over 60 min",
        }
    }

    /// Returns all variants in ascending duration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Short, Self::Medium, Self::Long]
    }
}

/// The categorical dimensions records can be filtered and counted by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FacetKind {
    /// Canonical dispatch reason.
    Reason,
    /// Neighborhood name.
    Neighborhood,
    /// Police district.
    District,
    /// Duration band.
    Duration,
}

/// One `(label, count)` entry of a facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetBucket {
    /// Display label.
    pub label: String,
    /// Number of records carrying the label.
    pub count: u64,
}

impl FacetBucket {
    /// Creates a bucket.
    #[must_use]
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// An inclusive `[start, end]` window in epoch milliseconds.
///
/// Construction always yields `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    start: TimestampMs,
    end: TimestampMs,
}

impl TimeRange {
    /// Creates a range, swapping the bounds if they are given reversed.
    #[must_use]
    pub const fn new(a: TimestampMs, b: TimestampMs) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Computes the `(min, max)` extent of a set of timestamps, or `None`
    /// if the iterator is empty.
    #[must_use]
    pub fn extent_of(timestamps: impl IntoIterator<Item = TimestampMs>) -> Option<Self> {
        timestamps.into_iter().fold(None, |acc, ts| match acc {
            None => Some(Self { start: ts, end: ts }),
            Some(r) => Some(Self {
                start: r.start.min(ts),
                end: r.end.max(ts),
            }),
        })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(self) -> TimestampMs {
        self.start
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn end(self) -> TimestampMs {
        self.end
    }

    /// `end - start`.
    #[must_use]
    pub const fn span(self) -> TimestampMs {
        self.end - self.start
    }

    /// `true` when the range covers a single instant.
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        self.start == self.end
    }

    /// Whether `ts` lies within the range (inclusive on both ends).
    #[must_use]
    pub const fn contains(self, ts: TimestampMs) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Clamps `ts` into the range.
    #[must_use]
    pub fn clamp(self, ts: TimestampMs) -> TimestampMs {
        ts.clamp(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn record(duration: Option<&str>) -> FlightRecord {
        FlightRecord {
            date: Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap(),
            case_number: "23-0001".to_string(),
            duration: duration.map(String::from),
            reason: "Fire".to_string(),
            location: "100 MAIN ST".to_string(),
            coordinates: Some([-117.08, 32.64]),
            neighborhood: None,
            district: Some("  ".to_string()),
        }
    }

    #[test]
    fn duration_parsing_falls_back_to_zero() {
        assert!((record(Some(" 12.5 ")).duration_minutes() - 12.5).abs() < f64::EPSILON);
        assert!(record(None).duration_minutes().abs() < f64::EPSILON);
        assert!(record(Some("n/a")).duration_minutes().abs() < f64::EPSILON);
        assert!(record(Some("-4")).duration_minutes().abs() < f64::EPSILON);
    }

    #[test]
    fn duration_bucket_thresholds() {
        assert_eq!(DurationBucket::from_minutes(0.0), DurationBucket::Short);
        assert_eq!(DurationBucket::from_minutes(15.0), DurationBucket::Short);
        assert_eq!(DurationBucket::from_minutes(15.5), DurationBucket::Medium);
        assert_eq!(DurationBucket::from_minutes(60.0), DurationBucket::Medium);
        assert_eq!(DurationBucket::from_minutes(61.0), DurationBucket::Long);
        assert_eq!(record(None).duration_bucket(), DurationBucket::Short);
    }

    #[test]
    fn missing_labels_use_sentinels() {
        let r = record(None);
        assert_eq!(r.neighborhood_label(), UNKNOWN_NEIGHBORHOOD);
        assert_eq!(r.district_label(), UNASSIGNED_DISTRICT);
    }

    #[test]
    fn zero_coordinates_are_invalid() {
        let mut r = record(None);
        assert!(r.has_valid_coordinates());
        r.coordinates = Some([0.0, 32.64]);
        assert!(!r.has_valid_coordinates());
        r.coordinates = None;
        assert!(!r.has_valid_coordinates());
    }

    #[test]
    fn time_range_orders_bounds() {
        let r = TimeRange::new(10, 2);
        assert_eq!((r.start(), r.end()), (2, 10));
        assert_eq!(r.clamp(50), 10);
        assert_eq!(r.clamp(-5), 2);
        assert!(r.contains(2) && r.contains(10) && !r.contains(11));
    }

    #[test]
    fn extent_of_empty_is_none() {
        assert!(TimeRange::extent_of(std::iter::empty()).is_none());
        let r = TimeRange::extent_of([5, 1, 9]).unwrap();
        assert_eq!((r.start(), r.end()), (1, 9));
    }

    #[test]
    fn deserializes_camel_case_snapshot_row() {
        let json = serde_json::json!({
            "date": "2023-01-02T08:15:00Z",
            "caseNumber": "23-0002",
            "duration": "31",
            "reason": "Person with a gun",
            "location": "E ST / 3RD AVE",
            "coordinates": [-117.08, 32.64],
            "district": "4"
        });
        let r: FlightRecord = serde_json::from_value(json).unwrap();
        assert_eq!(r.case_number, "23-0002");
        assert_eq!(r.duration_bucket(), DurationBucket::Medium);
        assert!(r.neighborhood.is_none());
        assert_eq!(r.district_label(), "4");
    }
}
