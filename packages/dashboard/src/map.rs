//! Hand-off to the map renderer: record subsets as `GeoJSON` points.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::record::IndexedRecord;

/// Builds a point feature for one record, or `None` if it has no usable
/// coordinates.
#[must_use]
pub fn record_feature(record: &IndexedRecord) -> Option<Feature> {
    let raw = record.record();
    if !raw.has_valid_coordinates() {
        return None;
    }
    let [lon, lat] = raw.coordinates?;

    let mut properties = JsonObject::new();
    properties.insert("date".to_string(), raw.date.to_rfc3339().into());
    properties.insert("timestamp".to_string(), record.timestamp_ms().into());
    properties.insert("caseNumber".to_string(), raw.case_number.clone().into());
    properties.insert("reason".to_string(), record.canonical_reason().into());
    properties.insert("rawReason".to_string(), raw.reason.trim().into());
    properties.insert("durationMinutes".to_string(), raw.duration_minutes().into());
    properties.insert(
        "durationBucket".to_string(),
        record.duration_bucket().as_ref().into(),
    );
    properties.insert(
        "durationLabel".to_string(),
        record.duration_bucket().label().into(),
    );
    properties.insert("location".to_string(), raw.location.clone().into());
    properties.insert(
        "neighborhood".to_string(),
        record.neighborhood_label().into(),
    );
    properties.insert("district".to_string(), record.district_label().into());

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Builds a `FeatureCollection` from a record subset, skipping records
/// without coordinates.
#[must_use]
pub fn feature_collection<'a, I>(records: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a IndexedRecord>,
{
    FeatureCollection {
        bbox: None,
        features: records.into_iter().filter_map(record_feature).collect(),
        foreign_members: None,
    }
}

/// Builds the service-region outline as a polygon feature tagged
/// `"kind": "boundary"`, which the renderer uses for the edge fade.
/// Rings with fewer than four positions are not polygons and yield `None`.
#[must_use]
pub fn boundary_feature(ring: &[[f64; 2]]) -> Option<Feature> {
    if ring.len() < 4 {
        return None;
    }
    let positions = ring.iter().map(|&[lon, lat]| vec![lon, lat]).collect();

    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), "boundary".into());

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![positions]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}
