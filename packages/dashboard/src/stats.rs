//! Headline numbers for the stats panel.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use drone_map_flight_models::FacetBucket;
use serde::{Deserialize, Serialize};

use crate::facets::reason_buckets;
use crate::record::IndexedRecord;

/// Summary of a record subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Number of flights.
    pub flight_count: u64,
    /// Sum of flight durations, in minutes.
    pub total_minutes: f64,
    /// Mean flight duration, in minutes (0 when there are no flights).
    pub mean_minutes: f64,
    /// Number of distinct calendar days with at least one flight.
    pub active_days: usize,
    /// Earliest flight.
    pub first_flight: Option<DateTime<Utc>>,
    /// Latest flight.
    pub last_flight: Option<DateTime<Utc>>,
    /// Most frequent canonical reason.
    pub top_reason: Option<FacetBucket>,
}

impl SummaryStats {
    /// Computes stats over `records`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(records: &[&IndexedRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let total_minutes: f64 = records.iter().map(|r| r.record().duration_minutes()).sum();
        let active_days = records.iter().map(|r| r.day()).collect::<BTreeSet<_>>().len();
        let first_flight = records.iter().map(|r| r.record().date).min();
        let last_flight = records.iter().map(|r| r.record().date).max();
        let top_reason = reason_buckets(records.iter().copied()).into_iter().next();

        Self {
            flight_count: records.len() as u64,
            total_minutes,
            mean_minutes: total_minutes / records.len() as f64,
            active_days,
            first_flight,
            last_flight,
            top_reason,
        }
    }
}
