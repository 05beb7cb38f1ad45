#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering, facet aggregation and timeline playback for the drone
//! flight dashboard.
//!
//! [`Dashboard`] owns the immutable record set and the mutable UI state
//! (time window, facet selections, playback) and keeps every derived
//! collection consistent with them:
//!
//! * the date-filtered and fully filtered subsets,
//! * facet buckets (computed over the date-filtered subset),
//! * the activity histogram (facet-filtered, over the full extent),
//! * the records visible at the current playback position.
//!
//! Nothing here does I/O. Hosts feed records in once, call mutators in
//! response to UI events, and drive [`Dashboard::tick`] from a
//! [`ticker::PlaybackTicker`].

pub mod config;
pub mod facets;
pub mod filter;
pub mod histogram;
pub mod map;
pub mod record;
pub mod stats;
pub mod ticker;
pub mod timeline;

use chrono::NaiveDate;
use drone_map_flight_models::{
    DurationBucket, FacetBucket, FacetKind, FlightRecord, TimeRange, TimestampMs,
};
use geojson::FeatureCollection;

pub use config::{CONFIG_ENV, ConfigError, DashboardConfig, ViewMode};
pub use facets::Facets;
pub use filter::{FilterSelection, RangeFilterState};
pub use histogram::ActivityHistogram;
pub use record::IndexedRecord;
pub use stats::SummaryStats;
pub use timeline::{PlaybackState, PlaybackStatus, TickOutcome, TimelineEngine};

/// What a pointer drag on the timeline is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragTarget {
    /// The playhead (scrubbing).
    Playhead,
    /// The in point.
    RangeStart,
    /// The out point.
    RangeEnd,
}

/// Composed dashboard view-state.
pub struct Dashboard {
    config: DashboardConfig,
    records: Vec<IndexedRecord>,
    filter: RangeFilterState,
    timeline: TimelineEngine,
    show_all_reasons: bool,
    active_drag: Option<DragTarget>,
    date_filtered: Vec<usize>,
    filtered: Vec<usize>,
    facets: Facets,
    histogram: ActivityHistogram,
}

impl Dashboard {
    /// Creates an empty dashboard.
    #[must_use]
    pub fn new(config: DashboardConfig) -> Self {
        let filter = RangeFilterState::new(config.min_range_gap_ms);
        let timeline = TimelineEngine::new(&config);
        let histogram =
            ActivityHistogram::compute(std::iter::empty(), None, config.histogram_buckets);
        Self {
            config,
            records: Vec::new(),
            filter,
            timeline,
            show_all_reasons: false,
            active_drag: None,
            date_filtered: Vec::new(),
            filtered: Vec::new(),
            facets: Facets::default(),
            histogram,
        }
    }

    /// Creates a dashboard and loads `records` into it.
    #[must_use]
    pub fn with_records(config: DashboardConfig, records: Vec<FlightRecord>) -> Self {
        let mut dashboard = Self::new(config);
        dashboard.load(records);
        dashboard
    }

    /// Replaces the dataset. Records without usable coordinates are
    /// dropped; the rest are sorted by date. The time window resets to
    /// the full extent, selections are cleared and playback stops at the
    /// extent start.
    pub fn load(&mut self, records: Vec<FlightRecord>) {
        let offset = self.config.utc_offset();
        let total = records.len();
        let mut indexed: Vec<IndexedRecord> = records
            .into_iter()
            .filter(FlightRecord::has_valid_coordinates)
            .map(|r| IndexedRecord::new(r, offset))
            .collect();
        indexed.sort_by_key(IndexedRecord::timestamp_ms);

        if indexed.len() < total {
            log::warn!(
                "Dropped {} of {total} records without usable coordinates",
                total - indexed.len()
            );
        }

        let extent = TimeRange::extent_of(indexed.iter().map(IndexedRecord::timestamp_ms));
        self.records = indexed;
        self.filter.reset_extent(extent);
        self.filter.selection_mut().clear();
        self.timeline.reset(extent);
        self.active_drag = None;

        log::info!(
            "Loaded {} flights{}",
            self.records.len(),
            extent.map_or_else(String::new, |e| format!(
                " spanning {} .. {}",
                format_ts(e.start()),
                format_ts(e.end())
            ))
        );

        self.recompute_window();
        self.recompute_histogram();
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Every loaded record, sorted by date.
    #[must_use]
    pub fn records(&self) -> &[IndexedRecord] {
        &self.records
    }

    // ── Range / filter ──────────────────────────────────────────────

    /// Full extent of the loaded data.
    #[must_use]
    pub const fn extent(&self) -> Option<TimeRange> {
        self.filter.extent()
    }

    /// Active time window.
    #[must_use]
    pub const fn range(&self) -> Option<TimeRange> {
        self.filter.range()
    }

    /// Current facet selections.
    #[must_use]
    pub const fn selection(&self) -> &FilterSelection {
        self.filter.selection()
    }

    /// Sets the time window (clamped to the extent).
    pub fn set_range(&mut self, start: TimestampMs, end: TimestampMs) -> Option<TimeRange> {
        let range = self.filter.set_range(start, end);
        self.after_range_change();
        range
    }

    /// Moves the in point.
    pub fn set_in_point(&mut self, ts: TimestampMs) -> Option<TimeRange> {
        let range = self.filter.set_start_handle(ts);
        self.after_range_change();
        range
    }

    /// Moves the out point.
    pub fn set_out_point(&mut self, ts: TimestampMs) -> Option<TimeRange> {
        let range = self.filter.set_end_handle(ts);
        self.after_range_change();
        range
    }

    /// Resets the time window to the full extent.
    pub fn reset_range(&mut self) {
        if let Some(extent) = self.extent() {
            self.set_range(extent.start(), extent.end());
        }
    }

    /// Toggles a canonical reason.
    pub fn toggle_reason(&mut self, label: &str) {
        self.filter.selection_mut().toggle_reason(label);
        self.after_selection_change();
    }

    /// Toggles a neighborhood.
    pub fn toggle_neighborhood(&mut self, label: &str) {
        self.filter.selection_mut().toggle_neighborhood(label);
        self.after_selection_change();
    }

    /// Toggles a district.
    pub fn toggle_district(&mut self, label: &str) {
        self.filter.selection_mut().toggle_district(label);
        self.after_selection_change();
    }

    /// Toggles a duration band.
    pub fn toggle_duration_bucket(&mut self, bucket: DurationBucket) {
        self.filter.selection_mut().toggle_duration(bucket);
        self.after_selection_change();
    }

    /// Toggles `label` on any facet. Duration labels are band ids
    /// (`short`, `medium`, `long`).
    pub fn toggle(&mut self, kind: FacetKind, label: &str) {
        self.filter.selection_mut().toggle(kind, label);
        self.after_selection_change();
    }

    /// Clears every facet selection.
    pub fn clear_selection(&mut self) {
        self.filter.selection_mut().clear();
        self.after_selection_change();
    }

    /// Records inside the time window, before facet selections.
    #[must_use]
    pub fn date_filtered_records(&self) -> Vec<&IndexedRecord> {
        self.resolve(&self.date_filtered)
    }

    /// Records inside the time window that pass every facet selection.
    #[must_use]
    pub fn filtered_records(&self) -> Vec<&IndexedRecord> {
        self.resolve(&self.filtered)
    }

    /// Facet buckets over the date-filtered subset.
    #[must_use]
    pub const fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Reason buckets for display: the collapsed top list by default, the
    /// full list once expanded.
    #[must_use]
    pub fn reason_buckets(&self) -> Vec<FacetBucket> {
        if self.show_all_reasons {
            self.facets.reasons.clone()
        } else {
            facets::top_reasons(
                &self.facets.reasons,
                self.config.reason_min_count,
                self.config.reason_max_display,
                &self.selection().reasons,
            )
        }
    }

    /// Whether the full reason list is shown.
    #[must_use]
    pub const fn shows_all_reasons(&self) -> bool {
        self.show_all_reasons
    }

    /// Expands or collapses the reason list.
    pub const fn set_show_all_reasons(&mut self, show_all: bool) {
        self.show_all_reasons = show_all;
    }

    /// Summary of the filtered subset.
    #[must_use]
    pub fn summary(&self) -> SummaryStats {
        SummaryStats::compute(&self.filtered_records())
    }

    /// Activity histogram over the full extent.
    #[must_use]
    pub const fn histogram(&self) -> &ActivityHistogram {
        &self.histogram
    }

    // ── Timeline ────────────────────────────────────────────────────

    /// Playback state.
    #[must_use]
    pub const fn playback(&self) -> &PlaybackState {
        self.timeline.state()
    }

    /// Playback position.
    #[must_use]
    pub const fn position(&self) -> TimestampMs {
        self.timeline.position()
    }

    /// `true` while playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.timeline.is_playing()
    }

    /// Starts playback. Returns `false` if there is nothing to play.
    pub fn play(&mut self) -> bool {
        self.timeline.play(self.range())
    }

    /// Pauses playback.
    pub fn pause(&mut self) {
        self.timeline.pause();
    }

    /// Toggles play/pause. Returns the new playing flag.
    pub fn toggle_play(&mut self) -> bool {
        self.timeline.toggle_play(self.range())
    }

    /// Advances playback by one tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.timeline.tick(self.range())
    }

    /// Seeks to a timestamp (clamped into the window).
    pub fn seek(&mut self, ts: TimestampMs) {
        self.timeline.seek(ts, self.range());
    }

    /// Seeks to a track percentage of the full extent.
    pub fn seek_percent(&mut self, percent: f64) {
        self.timeline.seek_percent(percent, self.range());
    }

    /// Moves the playhead to the first instant of calendar `day` that lies
    /// in the window. Returns `false`, leaving the playhead alone, when
    /// the window does not touch `day`.
    pub fn seek_day(&mut self, day: NaiveDate) -> bool {
        let offset = self.config.utc_offset();
        let Some(range) = self.range() else {
            return false;
        };
        let first = record::calendar_day_of_ms(range.start(), offset);
        let last = record::calendar_day_of_ms(range.end(), offset);
        if day < first || day > last {
            log::warn!("{day} is outside the window ({first} to {last})");
            return false;
        }
        let midnight = record::day_start_ms(day, offset).unwrap_or_else(|| range.start());
        self.seek(midnight.max(range.start()));
        true
    }

    /// Enables or disables looping.
    pub const fn set_loop(&mut self, enabled: bool) {
        self.timeline.set_loop(enabled);
    }

    /// Sets the playback speed multiplier.
    pub fn set_speed(&mut self, speed: f64) {
        self.timeline.set_speed(speed);
    }

    /// Current view mode.
    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.timeline.mode()
    }

    /// Sets the view mode.
    pub const fn set_view_mode(&mut self, mode: ViewMode) {
        self.timeline.set_mode(mode);
    }

    /// Flips the view mode.
    pub const fn toggle_view_mode(&mut self) {
        self.timeline.toggle_mode();
    }

    /// Track percentage of a timestamp.
    #[must_use]
    pub fn percent_of(&self, ts: TimestampMs) -> f64 {
        self.timeline.percent_of(ts)
    }

    /// Timestamp at a track percentage.
    #[must_use]
    pub fn timestamp_at_percent(&self, percent: f64) -> TimestampMs {
        self.timeline.timestamp_at_percent(percent)
    }

    /// How far the playhead is through the active window, as a
    /// percentage. Missing or single-instant windows report 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn window_progress(&self) -> f64 {
        match self.range() {
            Some(range) if !range.is_degenerate() => {
                let elapsed = (range.clamp(self.position()) - range.start()) as f64;
                elapsed / range.span() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    /// The active window as `(start%, end%)` of the track.
    #[must_use]
    pub fn range_percent(&self) -> Option<(f64, f64)> {
        self.range()
            .map(|r| (self.percent_of(r.start()), self.percent_of(r.end())))
    }

    /// Records the map should show: the filtered flights on the playback
    /// day in single-day mode, or every filtered flight in all-data mode.
    #[must_use]
    pub fn visible_records(&self) -> Vec<&IndexedRecord> {
        match self.view_mode() {
            ViewMode::AllData => self.filtered_records(),
            ViewMode::SingleDay => {
                let day = record::calendar_day_of_ms(self.position(), self.config.utc_offset());
                self.filtered
                    .iter()
                    .map(|&i| &self.records[i])
                    .filter(|r| r.day() == day)
                    .collect()
            }
        }
    }

    /// Visible records as `GeoJSON` for the map.
    #[must_use]
    pub fn visible_features(&self) -> FeatureCollection {
        map::feature_collection(self.visible_records())
    }

    /// Filtered records as `GeoJSON` for the map.
    #[must_use]
    pub fn filtered_features(&self) -> FeatureCollection {
        map::feature_collection(self.filtered_records())
    }

    // ── Dragging ────────────────────────────────────────────────────

    /// Starts a pointer drag on the timeline at `percent` of the track.
    /// The pointer-down position is applied immediately. The drag ends
    /// when the returned session is dropped.
    pub fn begin_drag(&mut self, target: DragTarget, percent: f64) -> DragSession<'_> {
        self.active_drag = Some(target);
        log::debug!("Drag started on {target:?}");
        let mut session = DragSession {
            dashboard: self,
            target,
        };
        session.move_to_percent(percent);
        session
    }

    /// The drag in progress, if any.
    #[must_use]
    pub const fn active_drag(&self) -> Option<DragTarget> {
        self.active_drag
    }

    // ── Derivation ──────────────────────────────────────────────────

    fn resolve(&self, indices: &[usize]) -> Vec<&IndexedRecord> {
        indices.iter().map(|&i| &self.records[i]).collect()
    }

    fn after_range_change(&mut self) {
        self.timeline.on_range_changed(self.range());
        self.recompute_window();
    }

    fn after_selection_change(&mut self) {
        self.filtered = self.filter.facet_filtered(&self.records, &self.date_filtered);
        self.recompute_histogram();
        log::debug!(
            "Selection changed: {} of {} flights in window pass",
            self.filtered.len(),
            self.date_filtered.len()
        );
    }

    fn recompute_window(&mut self) {
        self.date_filtered = self.filter.date_filtered(&self.records);
        self.filtered = self.filter.facet_filtered(&self.records, &self.date_filtered);
        let facets = Facets::compute(&self.resolve(&self.date_filtered));
        self.facets = facets;
        log::debug!(
            "Window recomputed: {} in range, {} after facets",
            self.date_filtered.len(),
            self.filtered.len()
        );
    }

    fn recompute_histogram(&mut self) {
        let selection = self.filter.selection();
        let timestamps = self
            .records
            .iter()
            .filter(|r| selection.matches(r))
            .map(IndexedRecord::timestamp_ms);
        self.histogram =
            ActivityHistogram::compute(timestamps, self.extent(), self.config.histogram_buckets);
    }
}

/// An in-progress timeline drag. Dropping it ends the drag, however the
/// drag terminates.
pub struct DragSession<'a> {
    dashboard: &'a mut Dashboard,
    target: DragTarget,
}

impl DragSession<'_> {
    /// What this drag moves.
    #[must_use]
    pub const fn target(&self) -> DragTarget {
        self.target
    }

    /// Moves the dragged element to a track percentage.
    pub fn move_to_percent(&mut self, percent: f64) {
        let ts = self.dashboard.timestamp_at_percent(percent);
        self.move_to(ts);
    }

    /// Moves the dragged element to a timestamp.
    pub fn move_to(&mut self, ts: TimestampMs) {
        match self.target {
            DragTarget::Playhead => self.dashboard.seek(ts),
            DragTarget::RangeStart => {
                self.dashboard.set_in_point(ts);
            }
            DragTarget::RangeEnd => {
                self.dashboard.set_out_point(ts);
            }
        }
    }

    /// Read access to the dashboard mid-drag.
    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        self.dashboard
    }
}

impl Drop for DragSession<'_> {
    fn drop(&mut self) {
        self.dashboard.active_drag = None;
        log::debug!("Drag ended on {:?}", self.target);
    }
}

fn format_ts(ts: TimestampMs) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map_or_else(|| ts.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, FixedOffset, Utc};
    use drone_map_flight_models::{FlightRecord, TimestampMs};

    use crate::record::IndexedRecord;

    pub fn ms(rfc3339: &str) -> TimestampMs {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
            .timestamp_millis()
    }

    pub fn flight(rfc3339: &str, reason: &str) -> FlightRecord {
        FlightRecord {
            date: DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
            case_number: format!("case-{rfc3339}"),
            duration: None,
            reason: reason.to_string(),
            location: "276 FOURTH AVE".to_string(),
            coordinates: Some([-117.0842, 32.6401]),
            neighborhood: None,
            district: None,
        }
    }

    pub fn indexed_flights(specs: &[(&str, &str)]) -> Vec<IndexedRecord> {
        specs
            .iter()
            .map(|(date, reason)| {
                IndexedRecord::new(flight(date, reason), FixedOffset::east_opt(0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flight, ms};

    fn utc_config() -> DashboardConfig {
        DashboardConfig {
            utc_offset_minutes: Some(0),
            ..DashboardConfig::default()
        }
    }

    fn three_flight_dashboard() -> Dashboard {
        Dashboard::with_records(
            utc_config(),
            vec![
                flight("2023-01-02T09:00:00Z", "Fire"),
                flight("2023-01-01T08:00:00Z", "Person with a gun"),
                flight("2023-01-01T15:30:00Z", "person with gun"),
            ],
        )
    }

    #[test]
    fn load_sorts_and_sets_extent() {
        let dashboard = three_flight_dashboard();
        let timestamps: Vec<TimestampMs> = dashboard
            .records()
            .iter()
            .map(IndexedRecord::timestamp_ms)
            .collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        let extent = dashboard.extent().unwrap();
        assert_eq!(extent.start(), ms("2023-01-01T08:00:00Z"));
        assert_eq!(extent.end(), ms("2023-01-02T09:00:00Z"));
        assert_eq!(dashboard.range(), Some(extent));
        assert_eq!(dashboard.position(), extent.start());
    }

    #[test]
    fn load_drops_records_without_coordinates() {
        let mut missing = flight("2023-01-03T00:00:00Z", "Fire");
        missing.coordinates = None;
        let dashboard = Dashboard::with_records(
            utc_config(),
            vec![flight("2023-01-01T00:00:00Z", "Fire"), missing],
        );
        assert_eq!(dashboard.records().len(), 1);
    }

    #[test]
    fn reason_variants_merge_into_one_bucket() {
        let mut dashboard = three_flight_dashboard();
        dashboard.set_show_all_reasons(true);
        assert_eq!(
            dashboard.reason_buckets(),
            vec![
                FacetBucket::new("Person with weapon", 2),
                FacetBucket::new("Fire", 1),
            ]
        );
    }

    #[test]
    fn collapsed_reason_list_hides_long_tail() {
        let dashboard = three_flight_dashboard();
        assert!(dashboard.reason_buckets().is_empty());
    }

    #[test]
    fn single_day_window_shows_that_day() {
        let mut dashboard = three_flight_dashboard();
        dashboard.set_range(ms("2023-01-01T00:00:00Z"), ms("2023-01-01T23:59:59Z"));
        assert_eq!(dashboard.filtered_records().len(), 2);

        dashboard.seek(ms("2023-01-01T12:00:00Z"));
        assert_eq!(dashboard.visible_records().len(), 2);

        // The position cannot leave the window, so asking for the next
        // day lands on the window's last instant.
        dashboard.seek(ms("2023-01-02T09:00:00Z"));
        assert_eq!(dashboard.position(), ms("2023-01-01T23:59:59Z"));
        assert_eq!(dashboard.visible_records().len(), 2);
    }

    #[test]
    fn seek_day_rejects_days_outside_window() {
        let mut dashboard = three_flight_dashboard();
        dashboard.set_range(ms("2023-01-01T12:00:00Z"), ms("2023-01-01T23:59:59Z"));
        dashboard.seek(ms("2023-01-01T20:00:00Z"));

        let next_day = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        assert!(!dashboard.seek_day(next_day));
        assert_eq!(dashboard.position(), ms("2023-01-01T20:00:00Z"));

        // The window opens at noon, so the day is entered there.
        let first_day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(dashboard.seek_day(first_day));
        assert_eq!(dashboard.position(), ms("2023-01-01T12:00:00Z"));
        assert_eq!(dashboard.visible_records().len(), 1);
    }

    #[test]
    fn seek_day_lands_on_midnight_inside_window() {
        let mut dashboard = three_flight_dashboard();
        assert!(dashboard.seek_day(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()));
        assert_eq!(dashboard.position(), ms("2023-01-02T00:00:00Z"));
        assert_eq!(dashboard.visible_records().len(), 1);

        let mut empty = Dashboard::new(utc_config());
        assert!(!empty.seek_day(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()));
    }

    #[test]
    fn window_progress_is_relative_to_window() {
        let mut dashboard = three_flight_dashboard();
        dashboard.set_range(ms("2023-01-01T08:00:00Z"), ms("2023-01-01T16:00:00Z"));
        dashboard.seek(ms("2023-01-01T10:00:00Z"));
        assert!((dashboard.window_progress() - 25.0).abs() < 1e-9);
        assert!(Dashboard::new(utc_config()).window_progress().abs() < f64::EPSILON);
    }

    #[test]
    fn all_data_mode_ignores_position() {
        let mut dashboard = three_flight_dashboard();
        dashboard.seek(ms("2023-01-02T09:00:00Z"));
        assert_eq!(dashboard.visible_records().len(), 1);
        dashboard.toggle_view_mode();
        assert_eq!(dashboard.view_mode(), ViewMode::AllData);
        assert_eq!(dashboard.visible_records().len(), 3);
    }

    #[test]
    fn selecting_canonical_reason_selects_all_variants() {
        let mut dashboard = three_flight_dashboard();
        dashboard.toggle_reason("Person with weapon");
        let cases: Vec<&str> = dashboard
            .filtered_records()
            .iter()
            .map(|r| r.record().reason.as_str())
            .collect();
        assert_eq!(cases, ["Person with a gun", "person with gun"]);
        // Facets still describe the whole window.
        assert_eq!(dashboard.facets().reasons.len(), 2);
        // The histogram follows the selection.
        assert_eq!(dashboard.histogram().counts.iter().sum::<u64>(), 2);
    }

    #[test]
    fn generic_toggle_filters_by_duration_band() {
        let mut long = flight("2023-01-01T10:00:00Z", "Fire");
        long.duration = Some("90".to_string());
        let mut dashboard = Dashboard::with_records(
            utc_config(),
            vec![flight("2023-01-01T09:00:00Z", "Fire"), long],
        );
        dashboard.toggle(FacetKind::Duration, "long");
        assert_eq!(dashboard.filtered_records().len(), 1);
        dashboard.toggle(FacetKind::Duration, "forever");
        assert_eq!(dashboard.filtered_records().len(), 1);
        dashboard.clear_selection();
        assert_eq!(dashboard.filtered_records().len(), 2);
    }

    #[test]
    fn playback_runs_to_window_end_and_stops() {
        let base = ms("2023-01-01T00:00:00Z");
        let mut dashboard = Dashboard::with_records(
            utc_config(),
            vec![
                flight("2023-01-01T00:00:00Z", "Fire"),
                flight("2023-01-01T00:00:20Z", "Fire"),
            ],
        );
        assert_eq!(dashboard.range().unwrap().span(), 20_000);
        dashboard.seek(base);
        assert!(dashboard.play());

        let mut ticks = 0;
        while dashboard.is_playing() && ticks < 10_000 {
            dashboard.tick();
            ticks += 1;
        }
        assert_eq!(dashboard.position(), base + 20_000);
        assert!(!dashboard.is_playing());
    }

    #[test]
    fn dragging_in_point_past_out_point_stops_at_gap() {
        let mut dashboard = three_flight_dashboard();
        let end = dashboard.range().unwrap().end();
        dashboard.set_range(dashboard.extent().unwrap().start(), end - 60_000);
        let range_end = dashboard.range().unwrap().end();
        {
            let mut drag = dashboard.begin_drag(DragTarget::RangeStart, 0.0);
            assert_eq!(drag.dashboard().active_drag(), Some(DragTarget::RangeStart));
            drag.move_to(end);
        }
        assert_eq!(dashboard.active_drag(), None);
        let range = dashboard.range().unwrap();
        assert_eq!(range.start(), range_end - 1);
        assert_eq!(range.end(), range_end);
    }

    #[test]
    fn scrubbing_does_not_change_play_state() {
        let mut dashboard = three_flight_dashboard();
        dashboard.play();
        {
            let mut drag = dashboard.begin_drag(DragTarget::Playhead, 50.0);
            drag.move_to_percent(75.0);
        }
        assert!(dashboard.is_playing());
        let expected = dashboard.timestamp_at_percent(75.0);
        assert_eq!(dashboard.position(), expected);
    }

    #[test]
    fn shrinking_range_clamps_position() {
        let mut dashboard = three_flight_dashboard();
        dashboard.seek(ms("2023-01-02T09:00:00Z"));
        dashboard.set_out_point(ms("2023-01-01T20:00:00Z"));
        assert_eq!(dashboard.position(), ms("2023-01-01T20:00:00Z"));
    }

    #[test]
    fn empty_dataset_is_inert() {
        let mut dashboard = Dashboard::new(utc_config());
        dashboard.load(Vec::new());
        assert!(dashboard.range().is_none());
        assert!(!dashboard.play());
        assert_eq!(dashboard.tick(), TickOutcome::Idle);
        assert!(dashboard.visible_records().is_empty());
        assert!(dashboard.percent_of(42).abs() < f64::EPSILON);
        assert_eq!(dashboard.summary(), SummaryStats::default());
        assert_eq!(dashboard.histogram().len(), 80);
    }

    #[test]
    fn range_percent_tracks_handles() {
        let mut dashboard = three_flight_dashboard();
        let extent = dashboard.extent().unwrap();
        dashboard.set_in_point(extent.start() + extent.span() / 2);
        let (start, end) = dashboard.range_percent().unwrap();
        assert!((start - 50.0).abs() < 1e-6);
        assert!((end - 100.0).abs() < f64::EPSILON);
    }
}
