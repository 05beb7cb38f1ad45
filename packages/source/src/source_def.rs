//! Config-driven flight log source definition.
//!
//! [`SourceDefinition`] captures everything specific to one published
//! flight log: which open-data API serves it, how to page through it, and
//! which raw attributes hold each [`FlightRecord`] field.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use drone_map_flight_models::FlightRecord;
use serde::Deserialize;

use crate::SourceError;
use crate::arcgis::{self, ArcGisConfig};
use crate::parsing::{parse_date_value, parse_lon_lat, value_to_string};
use crate::progress::FetchProgress;
use crate::socrata::{self, SocrataConfig};

// ── Top-level source definition ──────────────────────────────────────────

/// A complete, config-driven flight log source.
#[derive(Debug, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"chula_vista_dfr"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Agency that publishes the log.
    pub agency: String,
    /// `GeoJSON` boundary of the service region.
    #[serde(default)]
    pub boundary_url: Option<String>,
    /// Where the rows are published. A definition without one can only
    /// be served from a snapshot.
    #[serde(default)]
    pub fetcher: Option<FetcherConfig>,
    /// Field name mappings for normalization.
    pub fields: FieldMapping,
}

/// Open-data API that publishes the flight log.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// `ArcGIS` REST API (`resultOffset`/`resultRecordCount`).
    Arcgis {
        /// Query URLs (one per layer).
        query_urls: Vec<String>,
        /// Records per page.
        page_size: u64,
        /// Optional `where` clause.
        #[serde(default)]
        where_clause: Option<String>,
    },
    /// Socrata SODA API (`$limit`/`$offset`/`$order`).
    Socrata {
        /// Resource URL ending in `.json`.
        api_url: String,
        /// Flight date column, used for ordering.
        date_column: String,
        /// Records per page.
        page_size: u64,
        /// Column holding a `GeoJSON` point location.
        #[serde(default)]
        point_column: Option<String>,
    },
}

impl FetcherConfig {
    /// Endpoint URLs this fetcher will page through.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&str> {
        match self {
            Self::Arcgis { query_urls, .. } => query_urls.iter().map(String::as_str).collect(),
            Self::Socrata { api_url, .. } => vec![api_url.as_str()],
        }
    }

    /// Fetches every raw row, stopping after `limit` rows when given.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if a page request or its JSON body fails.
    pub async fn fetch_rows(
        &self,
        client: &reqwest::Client,
        label: &str,
        limit: Option<u64>,
        progress: Arc<dyn FetchProgress>,
    ) -> Result<Vec<serde_json::Value>, SourceError> {
        match self {
            Self::Arcgis {
                query_urls,
                page_size,
                where_clause,
            } => {
                let config = ArcGisConfig {
                    query_urls,
                    label,
                    page_size: *page_size,
                    where_clause: where_clause.as_deref(),
                    limit,
                };
                arcgis::fetch_rows(client, &config, progress).await
            }
            Self::Socrata {
                api_url,
                date_column,
                page_size,
                point_column,
            } => {
                let config = SocrataConfig {
                    api_url,
                    date_column,
                    point_column: point_column.as_deref(),
                    label,
                    page_size: *page_size,
                    limit,
                };
                socrata::fetch_rows(client, &config, progress).await
            }
        }
    }
}

// ── Field mapping ────────────────────────────────────────────────────────

/// Maps raw attributes onto [`FlightRecord`] fields.
#[derive(Debug, Deserialize)]
pub struct FieldMapping {
    /// Flight date. Rows without a parseable date are dropped.
    pub date: DateExtractor,
    /// Case or incident number.
    pub case_number: TextExtractor,
    /// Flight duration in minutes.
    #[serde(default)]
    pub duration: Option<TextExtractor>,
    /// Free-text flight reason.
    pub reason: TextExtractor,
    /// Street location.
    #[serde(default)]
    pub location: Option<TextExtractor>,
    /// Longitude attribute.
    #[serde(default = "default_lon_field")]
    pub lon: String,
    /// Latitude attribute.
    #[serde(default = "default_lat_field")]
    pub lat: String,
    /// Neighborhood name.
    #[serde(default)]
    pub neighborhood: Option<TextExtractor>,
    /// Council or police district.
    #[serde(default)]
    pub district: Option<TextExtractor>,
}

fn default_lon_field() -> String {
    "_geometry_x".to_string()
}

fn default_lat_field() -> String {
    "_geometry_y".to_string()
}

// ── Strategy enums ───────────────────────────────────────────────────────

/// How to extract the flight date.
///
/// Either a bare field name (`date = "FlightDate"`) or a tagged table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DateExtractor {
    /// A single field holding epoch milliseconds or date-time text.
    Single(String),
    /// A tagged extractor.
    Tagged(DateExtractorTagged),
}

/// Tagged date extractors.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateExtractorTagged {
    /// Date field plus a separate `HH:MM` (or `HH:MM:SS`, or `HHMM`) time
    /// field.
    DatePlusTime {
        /// JSON field for the date portion.
        date_field: String,
        /// JSON field for the time string.
        time_field: String,
    },
    /// Fields tried in order; the first parseable date wins.
    FallbackChain {
        /// JSON field names.
        fields: Vec<String>,
    },
}

/// How to extract a text attribute.
///
/// Either a bare field name or a tagged table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextExtractor {
    /// A single JSON field.
    Single(String),
    /// A tagged extractor.
    Tagged(TextExtractorTagged),
}

/// Tagged text extractors.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextExtractorTagged {
    /// Combine multiple fields with a separator (skip empty fields).
    Combine {
        /// JSON field names to combine.
        fields: Vec<String>,
        /// Separator between non-empty values.
        separator: String,
    },
    /// Try fields in order, use the first non-empty value.
    FallbackChain {
        /// JSON field names, tried in order.
        fields: Vec<String>,
    },
}

// ── Helper methods on extractors ─────────────────────────────────────────

fn get_text(record: &serde_json::Value, field: &str) -> Option<String> {
    value_to_string(record.get(field)?)
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        let hour = s[..2].parse::<u32>().ok()?;
        let min = s[2..].parse::<u32>().ok()?;
        return NaiveTime::from_hms_opt(hour, min, 0);
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

impl DateExtractor {
    /// Extracts the flight date from a raw row.
    #[must_use]
    pub fn extract(&self, record: &serde_json::Value) -> Option<DateTime<Utc>> {
        match self {
            Self::Single(field) => parse_date_value(record.get(field)?),
            Self::Tagged(DateExtractorTagged::DatePlusTime {
                date_field,
                time_field,
            }) => {
                let date = parse_date_value(record.get(date_field)?)?;
                if let Some(time) = get_text(record, time_field)
                    && let Some(time) = parse_time_of_day(&time)
                {
                    return Some(NaiveDateTime::new(date.date_naive(), time).and_utc());
                }
                Some(date)
            }
            Self::Tagged(DateExtractorTagged::FallbackChain { fields }) => fields
                .iter()
                .filter_map(|f| record.get(f))
                .find_map(parse_date_value),
        }
    }
}

impl TextExtractor {
    /// Extracts a trimmed, non-empty string from a raw row.
    #[must_use]
    pub fn extract(&self, record: &serde_json::Value) -> Option<String> {
        match self {
            Self::Single(field) => get_text(record, field),
            Self::Tagged(TextExtractorTagged::Combine { fields, separator }) => {
                let parts: Vec<String> =
                    fields.iter().filter_map(|f| get_text(record, f)).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(separator))
                }
            }
            Self::Tagged(TextExtractorTagged::FallbackChain { fields }) => {
                fields.iter().find_map(|f| get_text(record, f))
            }
        }
    }
}

// ── Normalization ────────────────────────────────────────────────────────

impl SourceDefinition {
    /// Normalizes one raw row into a [`FlightRecord`].
    ///
    /// Returns `None` only when the date is missing or unparseable. Every
    /// other field degrades: text to empty, optional fields to `None`,
    /// zero or missing coordinates to `None`.
    #[must_use]
    pub fn normalize(&self, row: &serde_json::Value) -> Option<FlightRecord> {
        let fields = &self.fields;

        let Some(date) = fields.date.extract(row) else {
            log::debug!("{}: skipping row without a usable date", self.id);
            return None;
        };

        let extract_opt =
            |extractor: Option<&TextExtractor>| extractor.and_then(|e| e.extract(row));

        let coordinates = match (row.get(&fields.lon), row.get(&fields.lat)) {
            (Some(lon), Some(lat)) => parse_lon_lat(lon, lat),
            _ => None,
        };

        Some(FlightRecord {
            date,
            case_number: fields.case_number.extract(row).unwrap_or_default(),
            duration: extract_opt(fields.duration.as_ref()),
            reason: fields.reason.extract(row).unwrap_or_default(),
            location: extract_opt(fields.location.as_ref()).unwrap_or_default(),
            coordinates,
            neighborhood: extract_opt(fields.neighborhood.as_ref()),
            district: extract_opt(fields.district.as_ref()),
        })
    }
}

/// Parses a TOML string into a [`SourceDefinition`].
///
/// # Errors
///
/// Returns [`SourceError::Definition`] if the TOML is invalid.
pub fn parse_source_toml(name: &str, toml_str: &str) -> Result<SourceDefinition, SourceError> {
    toml::de::from_str(toml_str).map_err(|source| SourceError::Definition {
        name: name.to_string(),
        source,
    })
}
