//! Playback position and play/pause/loop/speed state.
//!
//! The engine never reads the clock. The host calls [`TimelineEngine::tick`]
//! on its fixed interval (see [`crate::ticker`]) and passes in the active
//! range each time, so the position is re-clamped against whatever the
//! range currently is.

use drone_map_flight_models::{TimeRange, TimestampMs};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::config::{DashboardConfig, ViewMode};

/// Whether the timeline is advancing on its own.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackStatus {
    /// Position only moves on seeks.
    #[default]
    Stopped,
    /// Position advances on every tick.
    Playing,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing changed.
    Idle,
    /// Position moved forward by one step.
    Advanced,
    /// Position hit the range end and wrapped to the start.
    Wrapped,
    /// Position hit the range end and playback stopped.
    Finished,
}

/// Mutable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current playback position.
    pub current_ts: TimestampMs,
    /// Playing or stopped.
    pub status: PlaybackStatus,
    /// Wrap to the range start instead of stopping at the end.
    pub loop_enabled: bool,
    /// Step multiplier.
    pub speed: f64,
}

impl PlaybackState {
    /// `true` while playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

/// Playback state machine plus the track mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEngine {
    extent: Option<TimeRange>,
    state: PlaybackState,
    mode: ViewMode,
    steps_per_range: u32,
}

impl TimelineEngine {
    /// Creates a stopped engine with the configured defaults.
    #[must_use]
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            extent: None,
            state: PlaybackState {
                current_ts: 0,
                status: PlaybackStatus::Stopped,
                loop_enabled: config.default_loop,
                speed: config.default_speed,
            },
            mode: config.default_view_mode,
            steps_per_range: config.steps_per_range.max(1),
        }
    }

    /// Installs a new dataset extent: playback stops and the position
    /// moves to the extent start.
    pub fn reset(&mut self, extent: Option<TimeRange>) {
        self.extent = extent;
        self.state.status = PlaybackStatus::Stopped;
        self.state.current_ts = extent.map_or(0, TimeRange::start);
    }

    /// Current playback state.
    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current playback position.
    #[must_use]
    pub const fn position(&self) -> TimestampMs {
        self.state.current_ts
    }

    /// `true` while playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Current view mode.
    #[must_use]
    pub const fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Switches view mode.
    pub const fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Flips between single-day and all-data views.
    pub const fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::SingleDay => ViewMode::AllData,
            ViewMode::AllData => ViewMode::SingleDay,
        };
    }

    /// Enables or disables looping.
    pub const fn set_loop(&mut self, enabled: bool) {
        self.state.loop_enabled = enabled;
    }

    /// Sets the speed multiplier. Non-finite or non-positive values are
    /// ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.state.speed = speed;
        } else {
            log::warn!(
                "Ignoring invalid playback speed {speed}; keeping {}",
                self.state.speed
            );
        }
    }

    /// Starts playback within `range`. A position outside the range, or
    /// parked on its end, restarts from the range start. Returns `false`
    /// (and stays stopped) when there is no range or it is degenerate.
    pub fn play(&mut self, range: Option<TimeRange>) -> bool {
        let Some(range) = range.filter(|r| !r.is_degenerate()) else {
            log::debug!("Not starting playback: no playable range");
            return false;
        };
        if !range.contains(self.state.current_ts) || self.state.current_ts == range.end() {
            self.state.current_ts = range.start();
        }
        self.state.status = PlaybackStatus::Playing;
        log::debug!(
            "Playback started at {} (speed {}x, loop {})",
            self.state.current_ts,
            self.state.speed,
            self.state.loop_enabled
        );
        true
    }

    /// Stops playback, keeping the position.
    pub fn pause(&mut self) {
        if self.is_playing() {
            log::debug!("Playback paused at {}", self.state.current_ts);
        }
        self.state.status = PlaybackStatus::Stopped;
    }

    /// Plays if stopped, pauses if playing. Returns the new playing flag.
    pub fn toggle_play(&mut self, range: Option<TimeRange>) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play(range)
        }
    }

    /// Distance one tick moves the position within `range`:
    /// `max(1, span / steps_per_range * speed)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn step_size(&self, range: TimeRange) -> TimestampMs {
        let raw = range.span() as f64 / f64::from(self.steps_per_range) * self.state.speed;
        if raw.is_finite() {
            (raw.round() as TimestampMs).max(1)
        } else {
            1
        }
    }

    /// Advances one step if playing.
    pub fn tick(&mut self, range: Option<TimeRange>) -> TickOutcome {
        if !self.is_playing() {
            return TickOutcome::Idle;
        }
        let Some(range) = range.filter(|r| !r.is_degenerate()) else {
            self.state.status = PlaybackStatus::Stopped;
            if let Some(range) = range {
                self.state.current_ts = range.start();
            }
            return TickOutcome::Finished;
        };

        let next = range
            .clamp(self.state.current_ts)
            .saturating_add(self.step_size(range));

        if next < range.end() {
            self.state.current_ts = next;
            TickOutcome::Advanced
        } else if self.state.loop_enabled {
            self.state.current_ts = range.start();
            TickOutcome::Wrapped
        } else {
            self.state.current_ts = range.end();
            self.state.status = PlaybackStatus::Stopped;
            log::debug!("Playback reached end of range at {}", range.end());
            TickOutcome::Finished
        }
    }

    /// Moves the position to `ts`, clamped into `range`. Play state is
    /// unchanged.
    pub fn seek(&mut self, ts: TimestampMs, range: Option<TimeRange>) {
        self.state.current_ts = range.map_or(ts, |r| r.clamp(ts));
    }

    /// Seeks to a point on the track given as a percentage of the full
    /// extent.
    pub fn seek_percent(&mut self, percent: f64, range: Option<TimeRange>) {
        let ts = self.timestamp_at_percent(percent);
        self.seek(ts, range);
    }

    /// Re-clamps the position after the active range changed.
    pub fn on_range_changed(&mut self, range: Option<TimeRange>) {
        if let Some(range) = range {
            self.state.current_ts = range.clamp(self.state.current_ts);
            if range.is_degenerate() && self.is_playing() {
                self.state.status = PlaybackStatus::Stopped;
            }
        }
    }

    /// Position of `ts` on the track, as a percentage (0-100) of the full
    /// dataset extent. Degenerate or missing extents map to 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_of(&self, ts: TimestampMs) -> f64 {
        match self.extent {
            Some(extent) if !extent.is_degenerate() => {
                let offset = (extent.clamp(ts) - extent.start()) as f64;
                offset / extent.span() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    /// Timestamp at a track percentage (clamped to 0-100) of the full
    /// extent. Returns the extent start (or 0) for degenerate extents.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn timestamp_at_percent(&self, percent: f64) -> TimestampMs {
        let Some(extent) = self.extent else {
            return 0;
        };
        if extent.is_degenerate() || !percent.is_finite() {
            return extent.start();
        }
        let fraction = percent.clamp(0.0, 100.0) / 100.0;
        let offset = (extent.span() as f64 * fraction).round() as TimestampMs;
        extent.clamp(extent.start().saturating_add(offset))
    }
}
