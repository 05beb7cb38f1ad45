//! Time window and facet selection flags shared by the subcommands.

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use drone_map_dashboard::Dashboard;
use drone_map_flight_models::DurationBucket;
use drone_map_source::parsing::parse_datetime_str;

/// Window and facet filters applied before a command runs.
#[derive(Debug, Clone, Default, Args)]
pub struct WindowArgs {
    /// Window start (ISO 8601, RFC 3339 or `MM/DD/YYYY HH:MM`)
    #[arg(long, value_parser = parse_instant)]
    pub from: Option<DateTime<Utc>>,

    /// Window end; a bare date includes the whole day
    #[arg(long, value_parser = parse_window_end)]
    pub to: Option<DateTime<Utc>>,

    /// Keep flights with this reason (repeatable; raw variants are
    /// normalized)
    #[arg(long = "reason")]
    pub reasons: Vec<String>,

    /// Keep flights in this neighborhood (repeatable)
    #[arg(long = "neighborhood")]
    pub neighborhoods: Vec<String>,

    /// Keep flights in this district (repeatable)
    #[arg(long = "district")]
    pub districts: Vec<String>,

    /// Keep flights in this duration band: short, medium or long
    /// (repeatable)
    #[arg(long = "duration")]
    pub durations: Vec<DurationBucket>,
}

impl WindowArgs {
    /// Applies the window and selections to `dashboard`.
    pub fn apply(&self, dashboard: &mut Dashboard) {
        if let Some(extent) = dashboard.extent()
            && (self.from.is_some() || self.to.is_some())
        {
            let start = self.from.map_or(extent.start(), |d| d.timestamp_millis());
            let end = self.to.map_or(extent.end(), |d| d.timestamp_millis());
            if let Some(range) = dashboard.set_range(start, end) {
                log::debug!("Window set to {}..{}", range.start(), range.end());
            }
        }

        for reason in &self.reasons {
            dashboard.toggle_reason(&drone_map_reason::canonicalize(reason));
        }
        for neighborhood in &self.neighborhoods {
            dashboard.toggle_neighborhood(neighborhood);
        }
        for district in &self.districts {
            dashboard.toggle_district(district);
        }
        for &bucket in &self.durations {
            dashboard.toggle_duration_bucket(bucket);
        }
    }
}

/// Parses a date-time flag.
///
/// # Errors
///
/// Returns a message naming the accepted formats.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    parse_datetime_str(s)
        .ok_or_else(|| format!("unrecognized date {s:?} (expected ISO 8601 or MM/DD/YYYY HH:MM)"))
}

/// Parses a calendar day flag.
///
/// # Errors
///
/// Returns a message naming the accepted formats.
pub fn parse_day(s: &str) -> Result<NaiveDate, String> {
    parse_bare_date(s)
        .ok_or_else(|| format!("unrecognized day {s:?} (expected YYYY-MM-DD or MM/DD/YYYY)"))
}

fn parse_bare_date(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s.trim(), format).ok())
}

/// Parses a window end. A bare date means the last millisecond of that
/// day.
///
/// # Errors
///
/// Returns a message naming the accepted formats.
pub fn parse_window_end(s: &str) -> Result<DateTime<Utc>, String> {
    if let Some(end) = parse_bare_date(s).and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)) {
        return Ok(end.and_utc());
    }
    parse_instant(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_end_date_covers_whole_day() {
        let end = parse_window_end("2023-01-01").unwrap();
        assert_eq!(end.to_rfc3339(), "2023-01-01T23:59:59.999+00:00");
        let end = parse_window_end("2023-01-01T12:00:00Z").unwrap();
        assert_eq!(end.to_rfc3339(), "2023-01-01T12:00:00+00:00");
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_instant("yesterday").is_err());
        assert!(parse_window_end("yesterday").is_err());
        assert!(parse_day("yesterday").is_err());
    }

    #[test]
    fn day_flag_is_a_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(parse_day("2023-01-05"), Ok(day));
        assert_eq!(parse_day("01/05/2023"), Ok(day));
        assert!(parse_day("2023-01-05T12:00:00Z").is_err());
    }
}
