#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line host for the drone flight dashboard.
//!
//! `refresh` rebuilds the local snapshot from the published flight log;
//! `summary`, `export` and `play` load the snapshot (falling back to a
//! live fetch) into a [`Dashboard`] and drive it headlessly.
//!
//! Uses `indicatif-log-bridge` (via [`drone_map_cli_utils::init_logger`])
//! so log lines and progress bars never fight for the terminal.

mod play;
mod window;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use drone_map_cli_utils::{DownloadBar, MultiProgress};
use drone_map_dashboard::{
    CONFIG_ENV, Dashboard, DashboardConfig, Facets, SummaryStats, ViewMode, map,
};
use drone_map_flight_models::{FacetBucket, TimeRange};
use drone_map_source::boundary::Boundary;
use drone_map_source::progress::{self, FetchProgress};
use drone_map_source::registry::{DEFAULT_SOURCE_ID, resolve_source};
use drone_map_source::source_def::SourceDefinition;
use drone_map_source::{FetchOptions, fetch_dataset, paths, snapshot};
use geojson::FeatureCollection;
use serde::Serialize;

use crate::window::{WindowArgs, parse_day};

#[derive(Parser)]
#[command(name = "drone_map", about = "Drone flight log dashboard")]
struct Cli {
    /// Dashboard config TOML (defaults to `$DRONE_MAP_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot file (defaults to `$DRONE_MAP_SNAPSHOT`, then
    /// `data/flights.json`)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Built-in flight log source id
    #[arg(long, global = true, default_value = DEFAULT_SOURCE_ID)]
    source: String,

    /// Source definition TOML to use instead of the built-in one (defaults
    /// to `$DRONE_MAP_SOURCE_FILE`)
    #[arg(long, global = true)]
    source_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the flight log and rewrite the local snapshot
    Refresh {
        /// Maximum rows to fetch
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Print summary statistics and facet counts as JSON
    Summary {
        #[command(flatten)]
        window: WindowArgs,

        /// List every reason instead of the collapsed top list
        #[arg(long)]
        all_reasons: bool,
    },
    /// Write the filtered flights as a `GeoJSON` `FeatureCollection`
    Export {
        #[command(flatten)]
        window: WindowArgs,

        /// Only flights on this calendar day; must fall inside the window
        #[arg(long, value_parser = parse_day)]
        day: Option<NaiveDate>,

        /// Append the service-region outline as a polygon feature
        #[arg(long)]
        boundary: bool,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Run timeline playback on the real ticker
    Play {
        #[command(flatten)]
        window: WindowArgs,

        /// Playback speed multiplier
        #[arg(long)]
        speed: Option<f64>,

        /// Wrap to the window start instead of stopping at the end
        #[arg(long = "loop")]
        looping: bool,

        /// Count every filtered flight rather than the playback day
        #[arg(long)]
        all_data: bool,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}

/// Which published log a report was built from.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceInfo {
    id: String,
    name: String,
    agency: String,
}

/// JSON printed by `summary`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryReport {
    source: SourceInfo,
    window: Option<TimeRange>,
    summary: SummaryStats,
    reasons: Vec<FacetBucket>,
    neighborhoods: Vec<FacetBucket>,
    districts: Vec<FacetBucket>,
    durations: Vec<FacetBucket>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = drone_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let config = DashboardConfig::load_or_default(config_path.as_deref())?;
    let snapshot_path = cli.snapshot.clone().unwrap_or_else(paths::snapshot_path);
    let source = resolve_source(&cli.source, cli.source_file.as_deref())?;

    match cli.command {
        Commands::Refresh { limit } => {
            refresh(&multi, &source, &snapshot_path, limit).await?;
        }
        Commands::Summary {
            window,
            all_reasons,
        } => {
            let (mut dashboard, _) = load_dashboard(&multi, &source, &snapshot_path, config).await;
            window.apply(&mut dashboard);
            dashboard.set_show_all_reasons(all_reasons);
            let report = summary_report(&source, &dashboard);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Export {
            window,
            day,
            boundary,
            output,
        } => {
            let (mut dashboard, region) =
                load_dashboard(&multi, &source, &snapshot_path, config).await;
            window.apply(&mut dashboard);
            let outline = if boundary { region.as_ref() } else { None };
            let (collection, count) = export_collection(&mut dashboard, day, outline)?;
            match output {
                Some(path) => {
                    paths::ensure_parent_dir(&path)?;
                    std::fs::write(&path, collection.to_string())?;
                    log::info!("Exported {count} flights to {}", path.display());
                }
                None => println!("{collection}"),
            }
        }
        Commands::Play {
            window,
            speed,
            looping,
            all_data,
            max_ticks,
        } => {
            let (mut dashboard, _) = load_dashboard(&multi, &source, &snapshot_path, config).await;
            window.apply(&mut dashboard);
            if let Some(speed) = speed {
                dashboard.set_speed(speed);
            }
            if looping {
                dashboard.set_loop(true);
            }
            if all_data {
                dashboard.set_view_mode(ViewMode::AllData);
            }
            play::run(&multi, &mut dashboard, max_ticks).await?;
        }
    }

    Ok(())
}

async fn refresh(
    multi: &MultiProgress,
    source: &SourceDefinition,
    snapshot_path: &Path,
    limit: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = DownloadBar::start(multi, &source.name);
    let dataset = fetch_dataset(source, &FetchOptions { limit }, progress).await?;

    snapshot::write_snapshot(snapshot_path, &dataset.records)?;
    if let Some(boundary) = &dataset.boundary {
        snapshot::write_boundary(&paths::boundary_path(snapshot_path), boundary)?;
    }
    Ok(())
}

async fn load_dashboard(
    multi: &MultiProgress,
    source: &SourceDefinition,
    snapshot_path: &Path,
    config: DashboardConfig,
) -> (Dashboard, Option<Boundary>) {
    let progress: Arc<dyn FetchProgress> = if snapshot_path.exists() {
        progress::silent()
    } else {
        DownloadBar::start(multi, &source.name)
    };
    let dataset = snapshot::load_records(snapshot_path, source, progress).await;
    (Dashboard::with_records(config, dataset.records), dataset.boundary)
}

/// Features written by `export`: the flights on `day` (which must touch
/// the window) or every filtered flight, followed by the outline of
/// `region` when given. Also returns the number of flight features.
fn export_collection(
    dashboard: &mut Dashboard,
    day: Option<NaiveDate>,
    region: Option<&Boundary>,
) -> Result<(FeatureCollection, usize), String> {
    let mut collection = match day {
        Some(day) => {
            if !dashboard.seek_day(day) {
                return Err(format!("--day {day} is outside the selected window"));
            }
            dashboard.set_view_mode(ViewMode::SingleDay);
            dashboard.visible_features()
        }
        None => dashboard.filtered_features(),
    };
    let count = collection.features.len();

    if let Some(region) = region {
        match map::boundary_feature(&region.outer_ring()) {
            Some(outline) => collection.features.push(outline),
            None => log::warn!("Boundary has no usable outer ring"),
        }
    }
    Ok((collection, count))
}

fn summary_report(source: &SourceDefinition, dashboard: &Dashboard) -> SummaryReport {
    let Facets {
        neighborhoods,
        districts,
        durations,
        ..
    } = dashboard.facets().clone();

    SummaryReport {
        source: SourceInfo {
            id: source.id.clone(),
            name: source.name.clone(),
            agency: source.agency.clone(),
        },
        window: dashboard.range(),
        summary: dashboard.summary(),
        reasons: dashboard.reason_buckets(),
        neighborhoods,
        districts,
        durations,
    }
}
