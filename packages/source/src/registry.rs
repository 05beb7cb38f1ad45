//! Source registry: built-in flight log definitions, embedded at compile
//! time, plus definitions read from disk.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! via [`include_str!`]. Adding a source means adding a TOML file and a
//! line below. A definition file on disk (see [`SOURCE_FILE_ENV`]) takes
//! precedence, which is how a deployment supplies its endpoint.

use std::path::{Path, PathBuf};

use crate::SourceError;
use crate::source_def::{SourceDefinition, parse_source_toml};

/// Source used when none is requested explicitly.
pub const DEFAULT_SOURCE_ID: &str = "chula_vista_dfr";

/// Environment variable naming a source definition file.
pub const SOURCE_FILE_ENV: &str = "DRONE_MAP_SOURCE_FILE";

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[(
    "chula_vista_dfr",
    include_str!("../sources/chula_vista_dfr.toml"),
)];

/// Returns all configured source definitions.
///
/// # Errors
///
/// Returns [`SourceError::Definition`] if an embedded TOML is malformed.
pub fn all_sources() -> Result<Vec<SourceDefinition>, SourceError> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| parse_source_toml(name, toml))
        .collect()
}

/// Looks up a source by id.
///
/// # Errors
///
/// Returns [`SourceError::UnknownSource`] if no definition has that id, or
/// [`SourceError::Definition`] if the embedded TOML is malformed.
pub fn find_source(id: &str) -> Result<SourceDefinition, SourceError> {
    all_sources()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| SourceError::UnknownSource { id: id.to_string() })
}

/// Reads a source definition from a TOML file.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read, or
/// [`SourceError::Definition`] if it is not a valid definition.
pub fn load_source_file(path: &Path) -> Result<SourceDefinition, SourceError> {
    let toml = std::fs::read_to_string(path)?;
    let source = parse_source_toml(&path.display().to_string(), &toml)?;
    log::info!("Using source {} from {}", source.id, path.display());
    Ok(source)
}

/// Resolves the source to use: `file` when given, else the file named by
/// `$DRONE_MAP_SOURCE_FILE`, else the built-in definition `id`.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be loaded or `id` is
/// unknown.
pub fn resolve_source(id: &str, file: Option<&Path>) -> Result<SourceDefinition, SourceError> {
    let env_file = std::env::var_os(SOURCE_FILE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    match file.map(Path::to_path_buf).or(env_file) {
        Some(path) => load_source_file(&path),
        None => find_source(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_sources() {
        let sources = all_sources().unwrap();
        assert_eq!(sources.len(), SOURCE_TOMLS.len());
    }

    #[test]
    fn source_ids_are_unique() {
        let sources = all_sources().unwrap();
        let mut ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SOURCE_TOMLS.len());
    }

    #[test]
    fn default_source_exists() {
        let source = find_source(DEFAULT_SOURCE_ID).unwrap();
        assert_eq!(source.agency, "Chula Vista Police Department");
        assert!(source.fetcher.is_none());
        assert!(source.boundary_url.is_none());
    }

    #[test]
    fn source_file_overrides_built_in() {
        let path =
            std::env::temp_dir().join(format!("drone_map_source_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
id = "local_dfr"
name = "Local DFR"
agency = "Local PD"

[fetcher]
type = "socrata"
api_url = "http://127.0.0.1:9/resource/test.json"
date_column = "flight_date"
page_size = 100

[fields]
date = "flight_date"
case_number = "case_number"
reason = "reason"
"#,
        )
        .unwrap();

        let source = resolve_source(DEFAULT_SOURCE_ID, Some(&path)).unwrap();
        assert_eq!(source.id, "local_dfr");
        assert!(source.fetcher.is_some());

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(load_source_file(&path), Err(SourceError::Io(_))));
    }

    #[test]
    fn unknown_source_is_an_error() {
        assert!(matches!(
            find_source("atlantis"),
            Err(SourceError::UnknownSource { .. })
        ));
    }
}
