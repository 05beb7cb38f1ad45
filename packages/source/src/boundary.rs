//! Region boundary polygon.
//!
//! Parsed from `GeoJSON` and used for two things: dropping records that
//! fall outside the region, and handing the outer ring to the renderer
//! for the edge fade. Neither is required: a boundary that fails to load
//! means no filtering and no overlay.

use geo::{Contains, Coord, MultiPolygon, Point};
use geojson::GeoJson;

use crate::SourceError;

/// A region boundary as a multipolygon in `(lon, lat)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    polygons: MultiPolygon<f64>,
}

impl Boundary {
    /// Wraps an existing multipolygon.
    #[must_use]
    pub const fn new(polygons: MultiPolygon<f64>) -> Self {
        Self { polygons }
    }

    /// Parses a `GeoJSON` document. Accepts a bare `Polygon` or
    /// `MultiPolygon` geometry, a `Feature`, or a `FeatureCollection`
    /// (every polygonal feature is merged).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Boundary`] if the text is not `GeoJSON` or
    /// contains no polygons.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self, SourceError> {
        let geojson: GeoJson = geojson_str.parse().map_err(|e| SourceError::Boundary {
            message: format!("invalid GeoJSON: {e}"),
        })?;

        let geometries: Vec<geojson::Geometry> = match geojson {
            GeoJson::Geometry(geom) => vec![geom],
            GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|f| f.geometry)
                .collect(),
        };

        let polygons: Vec<geo::Polygon<f64>> = geometries
            .into_iter()
            .filter_map(|geom| geo::Geometry::<f64>::try_from(geom).ok())
            .flat_map(|geom| match geom {
                geo::Geometry::Polygon(p) => vec![p],
                geo::Geometry::MultiPolygon(mp) => mp.0,
                _ => Vec::new(),
            })
            .collect();

        if polygons.is_empty() {
            return Err(SourceError::Boundary {
                message: "no polygon geometry found".to_string(),
            });
        }

        Ok(Self::new(MultiPolygon(polygons)))
    }

    /// Whether `(lon, lat)` lies inside the boundary.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.contains(&Point::new(lon, lat))
    }

    /// Outer ring of the first polygon as `[lon, lat]` pairs, for the
    /// edge fade.
    #[must_use]
    pub fn outer_ring(&self) -> Vec<[f64; 2]> {
        self.polygons
            .0
            .first()
            .map(|polygon| {
                polygon
                    .exterior()
                    .coords()
                    .map(|&Coord { x, y }| [x, y])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The underlying multipolygon.
    #[must_use]
    pub const fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }
}

async fn download_boundary(client: &reqwest::Client, url: &str) -> Result<Boundary, SourceError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Boundary::from_geojson_str(&body)
}

/// Downloads and parses a boundary. Failures are logged and yield `None`.
pub async fn fetch_boundary(client: &reqwest::Client, url: &str) -> Option<Boundary> {
    match download_boundary(client, url).await {
        Ok(boundary) => {
            log::info!("Loaded boundary with {} polygon(s)", boundary.polygons.0.len());
            Some(boundary)
        }
        Err(e) => {
            log::warn!("Boundary unavailable, continuing without it: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "Feature",
        "properties": {"name": "square"},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-118.0, 32.0], [-117.0, 32.0], [-117.0, 33.0], [-118.0, 33.0], [-118.0, 32.0]]]
        }
    }"#;

    #[test]
    fn parses_feature_and_tests_containment() {
        let boundary = Boundary::from_geojson_str(SQUARE).unwrap();
        assert!(boundary.contains(-117.5, 32.5));
        assert!(!boundary.contains(-116.5, 32.5));
        assert_eq!(boundary.outer_ring().len(), 5);
        assert_eq!(boundary.outer_ring()[0], [-118.0, 32.0]);
    }

    #[test]
    fn merges_feature_collection() {
        let collection = format!(
            r#"{{"type": "FeatureCollection", "features": [{SQUARE}, {{
                "type": "Feature",
                "properties": {{}},
                "geometry": {{
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
                }}
            }}]}}"#
        );
        let boundary = Boundary::from_geojson_str(&collection).unwrap();
        assert_eq!(boundary.polygons().0.len(), 2);
        assert!(boundary.contains(0.7, 0.2));
    }

    #[test]
    fn rejects_non_polygonal_input() {
        let point = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        assert!(matches!(
            Boundary::from_geojson_str(point),
            Err(SourceError::Boundary { .. })
        ));
        assert!(Boundary::from_geojson_str("nope").is_err());
    }
}
