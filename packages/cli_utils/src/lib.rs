#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `drone_map` binary.
//!
//! Log lines and progress bars share one [`MultiProgress`]. [`init_logger`]
//! routes `log` records through `indicatif-log-bridge` so they print above
//! the bars, [`DownloadBar`] follows a flight log download, and
//! [`PlaybackBar`] follows headless playback through the active window.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use drone_map_source::progress::FetchProgress;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Resolution of [`PlaybackBar`]: one step per tenth of a percent.
const PLAYBACK_STEPS: u64 = 1000;

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Host part of an endpoint URL, for compact bar messages.
fn endpoint_host(endpoint: &str) -> &str {
    let rest = endpoint.split_once("://").map_or(endpoint, |(_, rest)| rest);
    rest.split(['/', '?']).next().unwrap_or(rest)
}

/// Spinner that turns into a row-count bar once the service reports how
/// many flights it holds.
pub struct DownloadBar {
    bar: ProgressBar,
    source: String,
}

impl DownloadBar {
    /// Adds a download bar for `source` to `multi`.
    #[must_use]
    pub fn start(multi: &MultiProgress, source: &str) -> Arc<Self> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(style("{spinner:.cyan} {msg} ({pos} rows)"));
        bar.set_message(format!("Downloading {source}"));
        Arc::new(Self {
            bar,
            source: source.to_string(),
        })
    }
}

impl FetchProgress for DownloadBar {
    fn rows_expected(&self, rows: u64) {
        let counted = style("  {msg} [{wide_bar:.cyan/dim}] {pos}/{len} rows [{eta}]");
        self.bar.set_length(rows);
        self.bar.set_style(counted);
    }

    fn page_received(&self, endpoint: &str, rows: u64) {
        let host = endpoint_host(endpoint);
        self.bar.inc(rows);
        self.bar.set_message(format!("{} from {host}", self.source));
    }

    fn finished(&self, source: &str, rows: u64) {
        let message = format!("{source}: {rows} flight rows downloaded");
        self.bar.finish_with_message(message);
    }
}

/// Bar tracking the playhead through the active window, labelled with
/// the playback day and the flights visible on it.
pub struct PlaybackBar {
    bar: ProgressBar,
}

/// Converts a window percentage into [`PlaybackBar`] steps.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn playback_steps(window_percent: f64) -> u64 {
    if !window_percent.is_finite() {
        return 0;
    }
    (window_percent.clamp(0.0, 100.0) * 10.0).round() as u64
}

impl PlaybackBar {
    /// Adds a playback bar for the window described by `window` to
    /// `multi`.
    #[must_use]
    pub fn start(multi: &MultiProgress, window: &str) -> Self {
        let bar = multi.add(ProgressBar::new(PLAYBACK_STEPS));
        bar.set_style(style("{prefix} [{wide_bar:.green/dim}] {percent:>3}% {msg}"));
        bar.set_prefix(window.to_string());
        Self { bar }
    }

    /// Moves the bar to `window_percent` and shows the flights visible on
    /// `day`.
    pub fn update(&self, window_percent: f64, day: NaiveDate, visible: usize) {
        self.bar.set_position(playback_steps(window_percent));
        self.bar.set_message(format!("{day}: {visible} flights"));
    }

    /// Leaves the bar in place with a closing message.
    pub fn finish(&self, ticks: u64) {
        self.bar.finish_with_message(format!("stopped after {ticks} ticks"));
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`, at `info`
/// unless `RUST_LOG` says otherwise.
///
/// Returns the [`MultiProgress`] that every bar must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let logger = builder.build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
