//! Local JSON snapshot of the flight log, with live-fetch fallback.
//!
//! The snapshot is a plain JSON array of [`FlightRecord`]s written by
//! `drone_map refresh`. Loading prefers the snapshot, falls back to a
//! live fetch, and degrades to an empty dataset when both fail: the
//! dashboard treats "no data" and "failed to load" the same way.

use std::path::Path;
use std::sync::Arc;

use drone_map_flight_models::FlightRecord;

use crate::boundary::Boundary;
use crate::progress::FetchProgress;
use crate::source_def::SourceDefinition;
use crate::{Dataset, FetchOptions, SourceError, fetch_dataset, paths};

/// Restricts records to valid coordinates (and to `boundary`, when
/// given) and sorts them by ascending date.
#[must_use]
pub fn prepare_records(
    records: Vec<FlightRecord>,
    boundary: Option<&Boundary>,
) -> Vec<FlightRecord> {
    let total = records.len();
    let mut prepared: Vec<FlightRecord> = records
        .into_iter()
        .filter(FlightRecord::has_valid_coordinates)
        .filter(|r| match (boundary, r.coordinates) {
            (Some(boundary), Some([lon, lat])) => boundary.contains(lon, lat),
            _ => true,
        })
        .collect();
    prepared.sort_by_key(|r| r.date);

    if prepared.len() < total {
        log::debug!(
            "Prepared {} of {total} records ({} without coordinates or outside the boundary)",
            prepared.len(),
            total - prepared.len()
        );
    }
    prepared
}

/// Writes `records` as a JSON array, creating parent directories.
///
/// # Errors
///
/// Returns [`SourceError`] if serialization or the write fails.
pub fn write_snapshot(path: &Path, records: &[FlightRecord]) -> Result<(), SourceError> {
    paths::ensure_parent_dir(path)?;
    let json = serde_json::to_string(records)?;
    std::fs::write(path, json)?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`].
///
/// # Errors
///
/// Returns [`SourceError`] if the file is missing or not a record array.
pub fn read_snapshot(path: &Path) -> Result<Vec<FlightRecord>, SourceError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Writes the boundary as a `GeoJSON` geometry next to the snapshot.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the write fails.
pub fn write_boundary(path: &Path, boundary: &Boundary) -> Result<(), SourceError> {
    paths::ensure_parent_dir(path)?;
    let geometry = geojson::Geometry::new(geojson::Value::from(boundary.polygons()));
    std::fs::write(path, geometry.to_string())?;
    Ok(())
}

/// Reads a cached boundary. Missing or invalid files yield `None`.
#[must_use]
pub fn read_boundary(path: &Path) -> Option<Boundary> {
    let text = std::fs::read_to_string(path).ok()?;
    match Boundary::from_geojson_str(&text) {
        Ok(boundary) => Some(boundary),
        Err(e) => {
            log::warn!("Ignoring cached boundary {}: {e}", path.display());
            None
        }
    }
}

/// Loads the dataset: the snapshot at `snapshot_path` (with the boundary
/// cached beside it) when readable, otherwise a live fetch of `source`,
/// otherwise nothing.
pub async fn load_records(
    snapshot_path: &Path,
    source: &SourceDefinition,
    progress: Arc<dyn FetchProgress>,
) -> Dataset {
    match read_snapshot(snapshot_path) {
        Ok(records) => {
            log::info!(
                "Loaded {} records from snapshot {}",
                records.len(),
                snapshot_path.display()
            );
            let boundary = read_boundary(&paths::boundary_path(snapshot_path));
            let records = prepare_records(records, boundary.as_ref());
            return Dataset { records, boundary };
        }
        Err(e) => {
            log::warn!(
                "Snapshot {} unavailable ({e}); fetching {} live",
                snapshot_path.display(),
                source.name
            );
        }
    }

    match fetch_dataset(source, &FetchOptions::default(), progress).await {
        Ok(dataset) => dataset,
        Err(SourceError::NoEndpoint { .. }) => {
            log::warn!("{} has no live endpoint; starting empty", source.name);
            Dataset::empty()
        }
        Err(e) => {
            log::warn!("Live fetch of {} failed: {e}; starting empty", source.name);
            Dataset::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::silent;
    use chrono::{TimeZone as _, Utc};

    fn record(day: u32, coordinates: Option<[f64; 2]>) -> FlightRecord {
        FlightRecord {
            date: Utc.with_ymd_and_hms(2023, 1, day, 12, 0, 0).unwrap(),
            case_number: format!("23-{day:04}"),
            duration: Some("8".to_string()),
            reason: "Fire".to_string(),
            location: "276 FOURTH AVE".to_string(),
            coordinates,
            neighborhood: None,
            district: None,
        }
    }

    fn square() -> Boundary {
        Boundary::from_geojson_str(
            r#"{"type": "Polygon", "coordinates": [[[-118.0, 32.0], [-117.0, 32.0], [-117.0, 33.0], [-118.0, 33.0], [-118.0, 32.0]]]}"#,
        )
        .unwrap()
    }

    #[test]
    fn prepare_filters_and_sorts() {
        let inside = Some([-117.5, 32.5]);
        let records = vec![
            record(3, inside),
            record(1, inside),
            record(2, None),
            record(4, Some([0.0, 0.0])),
            record(5, Some([-100.0, 40.0])),
        ];

        let prepared = prepare_records(records.clone(), Some(&square()));
        let days: Vec<String> = prepared.iter().map(|r| r.case_number.clone()).collect();
        assert_eq!(days, ["23-0001", "23-0003"]);

        let unbounded = prepare_records(records, None);
        assert_eq!(unbounded.len(), 3);
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("drone_map_snapshot_{}", std::process::id()));
        let path = dir.join("nested").join("flights.json");
        let records = vec![record(1, Some([-117.5, 32.5]))];

        write_snapshot(&path, &records).unwrap();
        assert_eq!(read_snapshot(&path).unwrap(), records);

        let boundary_path = dir.join("boundary.geojson");
        write_boundary(&boundary_path, &square()).unwrap();
        assert_eq!(read_boundary(&boundary_path), Some(square()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn snapshot_only_source() -> SourceDefinition {
        crate::source_def::parse_source_toml(
            "snapshot_only",
            r#"
id = "snapshot_only"
name = "Snapshot-only flights"
agency = "Test PD"

[fields]
date = "FlightDate"
case_number = "CaseNumber"
reason = "Reason"
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn load_prefers_snapshot_and_its_boundary() {
        let dir = std::env::temp_dir().join(format!("drone_map_load_{}", std::process::id()));
        let path = dir.join("flights.json");
        write_snapshot(
            &path,
            &[record(2, Some([-117.5, 32.5])), record(1, Some([-100.0, 40.0]))],
        )
        .unwrap();
        write_boundary(&paths::boundary_path(&path), &square()).unwrap();

        let dataset = load_records(&path, &snapshot_only_source(), silent()).await;
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].case_number, "23-0002");
        assert_eq!(dataset.boundary, Some(square()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn load_without_snapshot_or_endpoint_is_empty() {
        let path = std::env::temp_dir().join("drone_map_no_snapshot_here.json");
        let dataset = load_records(&path, &snapshot_only_source(), silent()).await;
        assert!(dataset.records.is_empty());
        assert!(dataset.boundary.is_none());
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let path = std::env::temp_dir().join("drone_map_definitely_missing.json");
        assert!(matches!(read_snapshot(&path), Err(SourceError::Io(_))));
        assert!(read_boundary(&path).is_none());
    }
}
