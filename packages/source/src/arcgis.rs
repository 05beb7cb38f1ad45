//! Paginated `ArcGIS` REST fetcher.
//!
//! Pages through one or more `FeatureServer`/`MapServer` query endpoints
//! and flattens each feature into its attribute object, with the point
//! geometry merged in as `_geometry_x`/`_geometry_y`.

use std::sync::Arc;

use crate::SourceError;
use crate::progress::FetchProgress;

/// Configuration for an `ArcGIS` fetch operation.
pub struct ArcGisConfig<'a> {
    /// Query URLs to fetch from. Results are concatenated in order.
    pub query_urls: &'a [String],
    /// Label for log messages.
    pub label: &'a str,
    /// Max records per request.
    pub page_size: u64,
    /// `where` clause; `"1=1"` when `None`.
    pub where_clause: Option<&'a str>,
    /// Stop after this many rows.
    pub limit: Option<u64>,
}

/// Sums `returnCountOnly` across every layer. `None` if any request
/// fails; the count only feeds the progress bar.
async fn query_counts(
    client: &reqwest::Client,
    config: &ArcGisConfig<'_>,
    where_clause: &str,
) -> Option<u64> {
    let mut total: u64 = 0;
    for query_url in config.query_urls {
        let url = format!("{query_url}?where={where_clause}&returnCountOnly=true&f=json");
        let response = client.get(&url).send().await.ok()?;
        let body: serde_json::Value = response.json().await.ok()?;
        total += body.get("count")?.as_u64()?;
    }
    Some(total)
}

/// Flattens `ArcGIS` features to their attributes, keeping point geometry
/// under `_geometry_x` / `_geometry_y`.
#[must_use]
pub fn flatten_features(body: &serde_json::Value) -> Vec<serde_json::Value> {
    let Some(features) = body.get("features").and_then(serde_json::Value::as_array) else {
        return Vec::new();
    };

    features
        .iter()
        .filter_map(|feature| {
            let mut record = feature.get("attributes")?.clone();
            if let Some(geom) = feature.get("geometry")
                && let Some(obj) = record.as_object_mut()
            {
                if let Some(x) = geom.get("x") {
                    obj.insert("_geometry_x".to_string(), x.clone());
                }
                if let Some(y) = geom.get("y") {
                    obj.insert("_geometry_y".to_string(), y.clone());
                }
            }
            Some(record)
        })
        .collect()
}

/// Whether the server reported more rows beyond this page.
///
/// `exceededTransferLimit` is the only reliable signal: servers silently
/// cap pages at their own `maxRecordCount`.
#[must_use]
pub fn has_more(body: &serde_json::Value) -> bool {
    body.get("exceededTransferLimit")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Fetches every row from the configured endpoints.
///
/// # Errors
///
/// Returns [`SourceError`] if a page request or its JSON body fails.
pub async fn fetch_rows(
    client: &reqwest::Client,
    config: &ArcGisConfig<'_>,
    progress: Arc<dyn FetchProgress>,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let fetch_limit = config.limit.unwrap_or(u64::MAX);
    let where_clause = config.where_clause.unwrap_or("1=1");
    let mut rows: Vec<serde_json::Value> = Vec::new();

    if let Some(total) = query_counts(client, config, where_clause).await {
        let target = fetch_limit.min(total);
        log::info!("{}: {total} records available (fetching {target})", config.label);
        progress.rows_expected(target);
    }

    for query_url in config.query_urls {
        let mut offset: u64 = 0;

        loop {
            let fetched = u64::try_from(rows.len()).unwrap_or(u64::MAX);
            let remaining = fetch_limit.saturating_sub(fetched);
            if remaining == 0 {
                break;
            }
            let page_limit = remaining.min(config.page_size);

            let url = format!(
                "{query_url}?where={where_clause}&outFields=*&f=json&outSR=4326&resultRecordCount={page_limit}&resultOffset={offset}"
            );
            log::debug!("{}: offset={offset}, limit={page_limit}", config.label);

            let response = client.get(&url).send().await?.error_for_status()?;
            let body: serde_json::Value = response.json().await?;

            let page = flatten_features(&body);
            let count = page.len() as u64;
            if count == 0 {
                break;
            }
            rows.extend(page);
            offset += count;
            progress.page_received(query_url, count);

            if !has_more(&body) {
                break;
            }
        }
    }

    rows.truncate(usize::try_from(fetch_limit).unwrap_or(usize::MAX));
    progress.finished(config.label, rows.len() as u64);
    log::info!("{}: download complete, {} records", config.label, rows.len());

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_attributes_with_geometry() {
        let body = json!({
            "features": [
                {
                    "attributes": {"CaseNumber": "23-001", "Reason": "Fire"},
                    "geometry": {"x": -117.08, "y": 32.64}
                },
                {"attributes": {"CaseNumber": "23-002"}},
                {"geometry": {"x": 1.0, "y": 2.0}}
            ],
            "exceededTransferLimit": true
        });

        let rows = flatten_features(&body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["_geometry_x"], json!(-117.08));
        assert_eq!(rows[0]["Reason"], "Fire");
        assert!(rows[1].get("_geometry_x").is_none());
        assert!(has_more(&body));
    }

    #[test]
    fn missing_features_is_empty_page() {
        let body = json!({"error": {"code": 400}});
        assert!(flatten_features(&body).is_empty());
        assert!(!has_more(&body));
    }
}
