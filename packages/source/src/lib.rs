#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record source for the drone flight dashboard.
//!
//! A [`source_def::SourceDefinition`] (embedded or on-disk TOML, see
//! [`registry`]) describes where the flight log lives and how raw rows map
//! onto [`FlightRecord`]. This crate fetches those rows from an `ArcGIS`
//! or Socrata endpoint, normalizes them, restricts them to the boundary
//! polygon and persists the result as a JSON snapshot. The dashboard core
//! only ever sees the prepared record list.

pub mod arcgis;
pub mod boundary;
pub mod parsing;
pub mod paths;
pub mod progress;
pub mod registry;
pub mod snapshot;
pub mod socrata;
pub mod source_def;

use std::sync::Arc;

use drone_map_flight_models::FlightRecord;

use crate::boundary::Boundary;
use crate::progress::FetchProgress;
use crate::source_def::SourceDefinition;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source definition could not be parsed.
    #[error("Invalid source definition {name}: {source}")]
    Definition {
        /// Name of the offending definition.
        name: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// No source definition with the requested id.
    #[error("Unknown source: {id}")]
    UnknownSource {
        /// The id that was requested.
        id: String,
    },

    /// The definition names no endpoint to fetch from.
    #[error("Source {id} has no fetcher endpoint configured")]
    NoEndpoint {
        /// Id of the definition.
        id: String,
    },

    /// Boundary `GeoJSON` could not be turned into a polygon.
    #[error("Boundary error: {message}")]
    Boundary {
        /// Description of what went wrong.
        message: String,
    },
}

/// Options for a dataset fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Maximum number of raw rows to fetch.
    pub limit: Option<u64>,
}

/// A prepared dataset ready for the dashboard.
pub struct Dataset {
    /// Prepared records (valid coordinates, inside the boundary, sorted).
    pub records: Vec<FlightRecord>,
    /// Boundary polygon, if one was configured and could be fetched.
    pub boundary: Option<Boundary>,
}

impl Dataset {
    /// A dataset with no records and no boundary.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
            boundary: None,
        }
    }
}

/// Fetches every raw row for `source`, normalizes it and prepares the
/// result for the dashboard. A boundary that cannot be fetched is logged
/// and skipped.
///
/// # Errors
///
/// Returns [`SourceError::NoEndpoint`] if the definition has no fetcher,
/// or another [`SourceError`] if the record fetch fails.
pub async fn fetch_dataset(
    source: &SourceDefinition,
    options: &FetchOptions,
    progress: Arc<dyn FetchProgress>,
) -> Result<Dataset, SourceError> {
    let Some(fetcher) = &source.fetcher else {
        return Err(SourceError::NoEndpoint {
            id: source.id.clone(),
        });
    };
    let client = reqwest::Client::new();

    log::info!(
        "Fetching {} ({}) from {}",
        source.name,
        source.agency,
        fetcher.endpoints().join(", ")
    );
    let raw = fetcher
        .fetch_rows(&client, &source.name, options.limit, progress)
        .await?;
    let total = raw.len();
    let records: Vec<FlightRecord> = raw.iter().filter_map(|row| source.normalize(row)).collect();
    if records.len() < total {
        log::info!(
            "{}: {} of {total} rows could not be normalized",
            source.name,
            total - records.len()
        );
    }

    let boundary = match &source.boundary_url {
        Some(url) => boundary::fetch_boundary(&client, url).await,
        None => None,
    };

    let records = snapshot::prepare_records(records, boundary.as_ref());
    log::info!("{}: {} flights ready", source.name, records.len());

    Ok(Dataset { records, boundary })
}
