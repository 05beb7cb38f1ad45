//! Paginated Socrata SODA fetcher.
//!
//! Pages a `/resource/<id>.json` endpoint with `$limit`/`$offset`, ordered
//! by the flight date column so pages stay stable while paging. When the
//! dataset stores its location as a `GeoJSON` point column, the point is
//! copied to `_geometry_x`/`_geometry_y` so field mappings read the same
//! coordinate keys as `ArcGIS` rows.

use std::sync::Arc;

use crate::SourceError;
use crate::progress::FetchProgress;

/// Configuration for a Socrata fetch operation.
pub struct SocrataConfig<'a> {
    /// Resource URL (e.g., `"https://data.example.gov/resource/abcd-1234.json"`).
    pub api_url: &'a str,
    /// Column used for `$order`.
    pub date_column: &'a str,
    /// Column holding a `GeoJSON` point, if any.
    pub point_column: Option<&'a str>,
    /// Label for log messages.
    pub label: &'a str,
    /// Max records per request.
    pub page_size: u64,
    /// Stop after this many rows.
    pub limit: Option<u64>,
}

/// Builds the URL for one page.
#[must_use]
pub fn page_url(config: &SocrataConfig<'_>, offset: u64, page_limit: u64) -> String {
    format!(
        "{}?$limit={page_limit}&$offset={offset}&$order={} ASC",
        config.api_url, config.date_column
    )
}

/// Reads the row count from a `$select=count(*)` response, which Socrata
/// returns as `[{"count": "1234"}]`.
#[must_use]
pub fn parse_count(body: &serde_json::Value) -> Option<u64> {
    let count = body.get(0)?.get("count")?;
    count
        .as_u64()
        .or_else(|| count.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Copies the `[lon, lat]` of a `GeoJSON` point column to
/// `_geometry_x`/`_geometry_y`. Rows without the column are unchanged.
pub fn flatten_point(row: &mut serde_json::Value, point_column: &str) {
    let coordinates = row
        .get(point_column)
        .and_then(|point| point.get("coordinates"))
        .and_then(serde_json::Value::as_array)
        .cloned();
    let (Some(coordinates), Some(obj)) = (coordinates, row.as_object_mut()) else {
        return;
    };
    if let [x, y, ..] = coordinates.as_slice() {
        obj.insert("_geometry_x".to_string(), x.clone());
        obj.insert("_geometry_y".to_string(), y.clone());
    }
}

async fn query_count(client: &reqwest::Client, config: &SocrataConfig<'_>) -> Option<u64> {
    let url = format!("{}?$select=count(*)", config.api_url);
    let body: serde_json::Value = client.get(&url).send().await.ok()?.json().await.ok()?;
    parse_count(&body)
}

/// Fetches every row from the resource.
///
/// # Errors
///
/// Returns [`SourceError`] if a page request or its JSON body fails.
pub async fn fetch_rows(
    client: &reqwest::Client,
    config: &SocrataConfig<'_>,
    progress: Arc<dyn FetchProgress>,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let fetch_limit = config.limit.unwrap_or(u64::MAX);
    let mut rows: Vec<serde_json::Value> = Vec::new();
    let mut offset: u64 = 0;

    if let Some(total) = query_count(client, config).await {
        let target = fetch_limit.min(total);
        log::info!("{}: {total} records available (fetching {target})", config.label);
        progress.rows_expected(target);
    }

    loop {
        let remaining = fetch_limit.saturating_sub(offset);
        if remaining == 0 {
            break;
        }
        let page_limit = remaining.min(config.page_size);
        log::debug!("{}: offset={offset}, limit={page_limit}", config.label);

        let response = client
            .get(page_url(config, offset, page_limit))
            .send()
            .await?
            .error_for_status()?;
        let mut page: Vec<serde_json::Value> = response.json().await?;

        let count = page.len() as u64;
        if count == 0 {
            break;
        }
        if let Some(column) = config.point_column {
            for row in &mut page {
                flatten_point(row, column);
            }
        }
        rows.extend(page);
        offset += count;
        progress.page_received(config.api_url, count);

        if count < page_limit {
            break;
        }
    }

    progress.finished(config.label, rows.len() as u64);
    log::info!("{}: download complete, {} records", config.label, rows.len());

    Ok(rows)
}
