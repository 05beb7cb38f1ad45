//! Count-sorted facet buckets over a record subset.
//!
//! Buckets are ordered by descending count. Ties keep first-seen order,
//! which for date-sorted input means the label that appeared earliest
//! wins.

use std::collections::{BTreeSet, HashMap};

use drone_map_flight_models::{DurationBucket, FacetBucket, FacetKind};
use serde::{Deserialize, Serialize};

use crate::record::IndexedRecord;

/// Counts records per label. `label_of` returning `None` (or an empty
/// label) leaves the record out of the facet.
pub fn count_by<'a, I, F>(records: I, label_of: F) -> Vec<FacetBucket>
where
    I: IntoIterator<Item = &'a IndexedRecord>,
    F: Fn(&'a IndexedRecord) -> Option<&'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut buckets: Vec<FacetBucket> = Vec::new();

    for record in records {
        let Some(label) = label_of(record).filter(|l| !l.is_empty()) else {
            continue;
        };
        if let Some(&i) = index.get(label) {
            buckets[i].count += 1;
        } else {
            index.insert(label, buckets.len());
            buckets.push(FacetBucket::new(label, 1));
        }
    }

    // `sort_by` is stable, so equal counts keep first-seen order.
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

/// Reason buckets keyed on the canonical label.
pub fn reason_buckets<'a, I>(records: I) -> Vec<FacetBucket>
where
    I: IntoIterator<Item = &'a IndexedRecord>,
{
    count_by(records, |r| Some(r.canonical_reason()))
}

/// Neighborhood buckets; missing names count under `"Unknown"`.
pub fn neighborhood_buckets<'a, I>(records: I) -> Vec<FacetBucket>
where
    I: IntoIterator<Item = &'a IndexedRecord>,
{
    count_by(records, |r| Some(r.neighborhood_label()))
}

/// District buckets; missing ids count under the unassigned sentinel.
pub fn district_buckets<'a, I>(records: I) -> Vec<FacetBucket>
where
    I: IntoIterator<Item = &'a IndexedRecord>,
{
    count_by(records, |r| Some(r.district_label()))
}

/// Duration-band buckets labelled with the band id. Empty bands are
/// omitted.
pub fn duration_buckets<'a, I>(records: I) -> Vec<FacetBucket>
where
    I: IntoIterator<Item = &'a IndexedRecord>,
{
    let mut counts = [0_u64; 3];
    for record in records {
        counts[band_index(record.duration_bucket())] += 1;
    }

    let mut buckets: Vec<FacetBucket> = DurationBucket::all()
        .iter()
        .map(|band| FacetBucket::new(band.as_ref(), counts[band_index(*band)]))
        .filter(|b| b.count > 0)
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

const fn band_index(band: DurationBucket) -> usize {
    match band {
        DurationBucket::Short => 0,
        DurationBucket::Medium => 1,
        DurationBucket::Long => 2,
    }
}

/// The collapsed "top reasons" view: reasons with at least `min_count`
/// flights, capped at `max_display` entries. Selected reasons that the
/// cut would hide are appended so an active filter stays visible.
#[must_use]
pub fn top_reasons(
    buckets: &[FacetBucket],
    min_count: u64,
    max_display: usize,
    selected: &BTreeSet<String>,
) -> Vec<FacetBucket> {
    let mut shown: Vec<FacetBucket> = buckets
        .iter()
        .filter(|b| b.count >= min_count)
        .take(max_display)
        .cloned()
        .collect();

    for bucket in buckets {
        if selected.contains(&bucket.label) && !shown.iter().any(|s| s.label == bucket.label) {
            shown.push(bucket.clone());
        }
    }

    shown
}

/// All four facets computed over one subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    /// Canonical reason buckets (full list, no threshold applied).
    pub reasons: Vec<FacetBucket>,
    /// Neighborhood buckets.
    pub neighborhoods: Vec<FacetBucket>,
    /// District buckets.
    pub districts: Vec<FacetBucket>,
    /// Duration band buckets.
    pub durations: Vec<FacetBucket>,
}

impl Facets {
    /// Computes every facet over `records`.
    #[must_use]
    pub fn compute(records: &[&IndexedRecord]) -> Self {
        Self {
            reasons: reason_buckets(records.iter().copied()),
            neighborhoods: neighborhood_buckets(records.iter().copied()),
            districts: district_buckets(records.iter().copied()),
            durations: duration_buckets(records.iter().copied()),
        }
    }

    /// Buckets for one facet.
    #[must_use]
    pub fn get(&self, kind: FacetKind) -> &[FacetBucket] {
        match kind {
            FacetKind::Reason => &self.reasons,
            FacetKind::Neighborhood => &self.neighborhoods,
            FacetKind::District => &self.districts,
            FacetKind::Duration => &self.durations,
        }
    }
}
