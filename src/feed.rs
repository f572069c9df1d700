//! Feed parsing: raw GeoJSON payload to normalized [`EventRecord`]s.
//!
//! Pure, no I/O. Retrieval lives in [`crate::client`].

use serde_json::Value;
use tracing::debug;

use crate::errors::QuakeError;
use crate::models::{EventRecord, RawFeature, RawFeatureCollection, RawProperties};

/// Parse a feed payload from its JSON text.
///
/// # Errors
///
/// Returns [`QuakeError::FeedFormat`] if the text is not JSON or has no
/// `features` list. Individual malformed features are skipped, not reported.
pub fn parse(payload: &str) -> Result<Vec<EventRecord>, QuakeError> {
    let collection: RawFeatureCollection = serde_json::from_str(payload)?;
    Ok(normalize(collection))
}

/// Parse an already-decoded JSON payload.
///
/// # Errors
///
/// Returns [`QuakeError::FeedFormat`] if the value has no `features` list.
pub fn parse_value(payload: Value) -> Result<Vec<EventRecord>, QuakeError> {
    let collection: RawFeatureCollection = serde_json::from_value(payload)?;
    Ok(normalize(collection))
}

fn normalize(collection: RawFeatureCollection) -> Vec<EventRecord> {
    if let Some(kind) = collection.type_.as_deref() {
        if kind != "FeatureCollection" {
            debug!("payload type is '{kind}', reading features anyway");
        }
    }

    let total = collection.features.len();
    let records: Vec<EventRecord> = collection
        .features
        .into_iter()
        .filter_map(to_record)
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        debug!("skipped {skipped} of {total} features without usable coordinates");
    }
    records
}

/// Convert one feature, or `None` when it cannot be placed on a map.
fn to_record(value: Value) -> Option<EventRecord> {
    let feature: RawFeature = serde_json::from_value(value).ok()?;
    let geometry = feature.geometry?;
    let coords = geometry.get("coordinates")?.as_array()?;
    if coords.len() < 3 {
        return None;
    }
    let lon = coords[0].as_f64()?;
    let lat = coords[1].as_f64()?;
    let depth = coords[2].as_f64();

    let props = feature
        .properties
        .as_ref()
        .map(RawProperties::from)
        .unwrap_or_default();

    Some(EventRecord {
        id: feature.id.as_ref().map(id_string).unwrap_or_default(),
        lon,
        lat,
        depth,
        mag: props.mag,
        time: props.time,
        place: props.place.unwrap_or_default(),
        external_url: props.url.filter(|u| !u.is_empty()),
    })
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "metadata": {"title": "USGS All Earthquakes, Past Day", "count": 4},
        "features": [
            {
                "type": "Feature",
                "id": "us7000abcd",
                "geometry": {"type": "Point", "coordinates": [142.37, 38.29, 24.5]},
                "properties": {
                    "mag": 5.4,
                    "time": 1700000000000,
                    "place": "75 km E of Ishinomaki, Japan",
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd"
                }
            },
            {
                "type": "Feature",
                "id": "ci40000001",
                "geometry": {"type": "Point", "coordinates": [-117.5, 35.7]},
                "properties": {"mag": 1.2}
            },
            {
                "type": "Feature",
                "id": "ak0000002",
                "geometry": {"type": "Point", "coordinates": [-150.1, 61.2, null]},
                "properties": {"mag": null, "time": null, "place": null}
            },
            {
                "type": "Feature",
                "id": "nc0000003",
                "geometry": null,
                "properties": {"mag": 2.0}
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample_feed() {
        let records = parse(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.id, "us7000abcd");
        assert!((first.lon - 142.37).abs() < 1e-9);
        assert!((first.lat - 38.29).abs() < 1e-9);
        assert_eq!(first.depth, Some(24.5));
        assert_eq!(first.mag, Some(5.4));
        assert_eq!(first.time, Some(1_700_000_000_000));
        assert_eq!(first.place, "75 km E of Ishinomaki, Japan");
        assert!(first.external_url.is_some());
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let records = parse(SAMPLE).unwrap();
        let sparse = &records[1];
        assert_eq!(sparse.id, "ak0000002");
        assert_eq!(sparse.depth, None);
        assert_eq!(sparse.mag, None);
        assert_eq!(sparse.time, None);
        assert_eq!(sparse.place, "");
        assert_eq!(sparse.external_url, None);
    }

    #[test]
    fn test_two_element_coordinates_dropped() {
        let payload = r#"{"features": [
            {"id": "x", "geometry": {"coordinates": [1.0, 2.0]}, "properties": {"mag": 3.0}}
        ]}"#;
        assert!(parse(payload).unwrap().is_empty());
    }

    #[test]
    fn test_empty_features_is_valid() {
        let records = parse(r#"{"features": []}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_features_is_format_error() {
        let err = parse(r#"{"type": "FeatureCollection"}"#).unwrap_err();
        assert!(matches!(err, QuakeError::FeedFormat(_)));

        let err = parse("[]").unwrap_err();
        assert!(matches!(err, QuakeError::FeedFormat(_)));
    }

    #[test]
    fn test_malformed_feature_skipped() {
        let payload = r#"{"features": [
            {"id": "bad", "geometry": {"coordinates": "nope"}},
            {"id": "good", "geometry": {"coordinates": [1.0, 2.0, 3.0]}}
        ]}"#;
        let records = parse(payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "good");
    }

    #[test]
    fn test_mistyped_properties_keep_feature() {
        let payload = r#"{"features": [
            {"id": "t", "geometry": {"coordinates": [1.0, 2.0, 3.0]},
             "properties": {"time": 1700000000000.0, "mag": 4.1}},
            {"id": "m", "geometry": {"coordinates": [1.0, 2.0, 3.0]},
             "properties": {"mag": "4.5", "place": "Somewhere"}},
            {"id": "p", "geometry": {"coordinates": [1.0, 2.0, 3.0]},
             "properties": {"place": 12, "url": false, "time": 5}}
        ]}"#;
        let records = parse(payload).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].time, Some(1_700_000_000_000));
        assert_eq!(records[0].mag, Some(4.1));

        assert_eq!(records[1].mag, None);
        assert_eq!(records[1].place, "Somewhere");

        assert_eq!(records[2].place, "");
        assert_eq!(records[2].external_url, None);
        assert_eq!(records[2].time, Some(5));
    }

    #[test]
    fn test_non_numeric_depth_reads_as_absent() {
        let payload = r#"{"features": [
            {"id": "d", "geometry": {"coordinates": [1.0, 2.0, "deep"]}},
            {"id": "l", "geometry": {"coordinates": ["1.0", 2.0, 3.0]}}
        ]}"#;
        let records = parse(payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "d");
        assert_eq!(records[0].depth, None);
    }

    #[test]
    fn test_duplicate_ids_kept() {
        let payload = r#"{"features": [
            {"id": "dup", "geometry": {"coordinates": [1.0, 2.0, 3.0]}},
            {"id": "dup", "geometry": {"coordinates": [4.0, 5.0, 6.0]}}
        ]}"#;
        let records = parse(payload).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id == "dup"));
    }

    #[test]
    fn test_parse_value_numeric_id() {
        let payload = serde_json::json!({
            "features": [{"id": 42, "geometry": {"coordinates": [0.0, 0.0, 10.0]}}]
        });
        let records = parse_value(payload).unwrap();
        assert_eq!(records[0].id, "42");
    }
}
