//! Canonical file paths for the local data directory.
//!
//! Paths resolve against the workspace `data/` directory unless
//! overridden through the environment.

use std::path::{Path, PathBuf};

/// Environment variable overriding the snapshot location.
pub const SNAPSHOT_ENV: &str = "DRONE_MAP_SNAPSHOT";

/// Returns the workspace root directory, resolved at compile time from
/// `CARGO_MANIFEST_DIR`. Falls back to the current directory.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the snapshot path: `$DRONE_MAP_SNAPSHOT` when set, otherwise
/// `data/flights.json`.
#[must_use]
pub fn snapshot_path() -> PathBuf {
    std::env::var_os(SNAPSHOT_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| data_dir().join("flights.json"), PathBuf::from)
}

/// Returns the path of the cached boundary `GeoJSON`, kept in the same
/// directory as `snapshot`.
#[must_use]
pub fn boundary_path(snapshot: &Path) -> PathBuf {
    snapshot.with_file_name("boundary.geojson")
}

/// Ensures the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}
