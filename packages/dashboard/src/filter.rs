//! Active time window and facet selections.
//!
//! [`RangeFilterState`] owns the mutable half of filtering; the filtered
//! subsets themselves are pure functions of `(records, state)`.

use std::collections::BTreeSet;

use drone_map_flight_models::{DurationBucket, FacetKind, TimeRange, TimestampMs};
use serde::{Deserialize, Serialize};

use crate::record::IndexedRecord;

/// Selected labels per facet. An empty set means that facet does not
/// filter. Facets combine with AND, labels within a facet with OR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    /// Selected canonical reasons.
    pub reasons: BTreeSet<String>,
    /// Selected neighborhood labels.
    pub neighborhoods: BTreeSet<String>,
    /// Selected district labels.
    pub districts: BTreeSet<String>,
    /// Selected duration bands.
    pub durations: BTreeSet<DurationBucket>,
}

impl FilterSelection {
    /// Adds `label` to the reason selection, or removes it if present.
    pub fn toggle_reason(&mut self, label: &str) {
        toggle(&mut self.reasons, label.to_string());
    }

    /// Adds or removes a neighborhood label.
    pub fn toggle_neighborhood(&mut self, label: &str) {
        toggle(&mut self.neighborhoods, label.to_string());
    }

    /// Adds or removes a district label.
    pub fn toggle_district(&mut self, label: &str) {
        toggle(&mut self.districts, label.to_string());
    }

    /// Adds or removes a duration band.
    pub fn toggle_duration(&mut self, bucket: DurationBucket) {
        toggle(&mut self.durations, bucket);
    }

    /// Toggles a label on the given facet. Duration labels must be band
    /// ids (`"short"`, `"medium"`, `"long"`); anything else is ignored.
    pub fn toggle(&mut self, kind: FacetKind, label: &str) {
        match kind {
            FacetKind::Reason => self.toggle_reason(label),
            FacetKind::Neighborhood => self.toggle_neighborhood(label),
            FacetKind::District => self.toggle_district(label),
            FacetKind::Duration => match label.parse::<DurationBucket>() {
                Ok(bucket) => self.toggle_duration(bucket),
                Err(_) => log::warn!("Ignoring unknown duration band {label:?}"),
            },
        }
    }

    /// Whether `label` is selected on the given facet.
    #[must_use]
    pub fn is_selected(&self, kind: FacetKind, label: &str) -> bool {
        match kind {
            FacetKind::Reason => self.reasons.contains(label),
            FacetKind::Neighborhood => self.neighborhoods.contains(label),
            FacetKind::District => self.districts.contains(label),
            FacetKind::Duration => label
                .parse::<DurationBucket>()
                .is_ok_and(|b| self.durations.contains(&b)),
        }
    }

    /// `true` when no facet filters anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
            && self.neighborhoods.is_empty()
            && self.districts.is_empty()
            && self.durations.is_empty()
    }

    /// Clears every facet.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether `record` passes every non-empty facet.
    #[must_use]
    pub fn matches(&self, record: &IndexedRecord) -> bool {
        (self.reasons.is_empty() || self.reasons.contains(record.canonical_reason()))
            && (self.neighborhoods.is_empty()
                || self.neighborhoods.contains(record.neighborhood_label()))
            && (self.districts.is_empty() || self.districts.contains(record.district_label()))
            && (self.durations.is_empty() || self.durations.contains(&record.duration_bucket()))
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// The active time window within the dataset extent, plus the facet
/// selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilterState {
    extent: Option<TimeRange>,
    range: Option<TimeRange>,
    selection: FilterSelection,
    min_gap_ms: TimestampMs,
}

impl RangeFilterState {
    /// Creates an empty state. `min_gap_ms` is the separation the in/out
    /// handles keep between each other (at least 1).
    #[must_use]
    pub fn new(min_gap_ms: TimestampMs) -> Self {
        Self {
            extent: None,
            range: None,
            selection: FilterSelection::default(),
            min_gap_ms: min_gap_ms.max(1),
        }
    }

    /// Installs a new dataset extent and resets the window to cover it.
    pub fn reset_extent(&mut self, extent: Option<TimeRange>) {
        self.extent = extent;
        self.range = extent;
    }

    /// Full extent of the loaded dataset.
    #[must_use]
    pub const fn extent(&self) -> Option<TimeRange> {
        self.extent
    }

    /// The active window. `None` until a non-empty dataset is loaded.
    #[must_use]
    pub const fn range(&self) -> Option<TimeRange> {
        self.range
    }

    /// Current facet selections.
    #[must_use]
    pub const fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// Mutable access to the facet selections.
    pub const fn selection_mut(&mut self) -> &mut FilterSelection {
        &mut self.selection
    }

    /// Sets the window, clamping both ends into the extent. Reversed
    /// bounds are swapped. No-op before a dataset is loaded.
    pub fn set_range(&mut self, start: TimestampMs, end: TimestampMs) -> Option<TimeRange> {
        let extent = self.extent?;
        let range = TimeRange::new(extent.clamp(start), extent.clamp(end));
        self.range = Some(range);
        Some(range)
    }

    /// Moves the in point. It never passes `end - min_gap`.
    pub fn set_start_handle(&mut self, ts: TimestampMs) -> Option<TimeRange> {
        let extent = self.extent?;
        let current = self.range.unwrap_or(extent);
        let end = current.end();
        let start = extent
            .clamp(ts)
            .min(end.saturating_sub(self.min_gap_ms))
            .max(extent.start())
            .min(end);
        let range = TimeRange::new(start, end);
        self.range = Some(range);
        Some(range)
    }

    /// Moves the out point. It never drops below `start + min_gap`.
    pub fn set_end_handle(&mut self, ts: TimestampMs) -> Option<TimeRange> {
        let extent = self.extent?;
        let current = self.range.unwrap_or(extent);
        let start = current.start();
        let end = extent
            .clamp(ts)
            .max(start.saturating_add(self.min_gap_ms))
            .min(extent.end())
            .max(start);
        let range = TimeRange::new(start, end);
        self.range = Some(range);
        Some(range)
    }

    /// Indices of `records` whose date lies in the window.
    ///
    /// `records` must be sorted by ascending timestamp.
    #[must_use]
    pub fn date_filtered(&self, records: &[IndexedRecord]) -> Vec<usize> {
        let Some(range) = self.range else {
            return Vec::new();
        };
        let lo = records.partition_point(|r| r.timestamp_ms() < range.start());
        let hi = records.partition_point(|r| r.timestamp_ms() <= range.end());
        (lo..hi.max(lo)).collect()
    }

    /// Narrows `candidates` (indices into `records`) by the facet
    /// selections.
    #[must_use]
    pub fn facet_filtered(&self, records: &[IndexedRecord], candidates: &[usize]) -> Vec<usize> {
        if self.selection.is_empty() {
            return candidates.to_vec();
        }
        candidates
            .iter()
            .copied()
            .filter(|&i| self.selection.matches(&records[i]))
            .collect()
    }

    /// Date window and facet selections applied together.
    #[must_use]
    pub fn filtered(&self, records: &[IndexedRecord]) -> Vec<usize> {
        self.facet_filtered(records, &self.date_filtered(records))
    }
}
