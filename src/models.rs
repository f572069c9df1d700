//! Data models for USGS earthquake feeds.
//!
//! The `Raw*` structures mirror the GeoJSON summary feed loosely: every field
//! the upstream may omit is optional, so a single odd feature never poisons
//! the whole payload. [`EventRecord`] is the normalized form the rest of the
//! crate works with.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Top-level GeoJSON response. Only `features` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeatureCollection {
    /// Usually "FeatureCollection"
    #[serde(rename = "type", default)]
    pub type_: Option<String>,

    /// Features are kept untyped so each one can be decoded on its own
    pub features: Vec<serde_json::Value>,
}

/// A single feature as it appears upstream.
///
/// Geometry and properties stay untyped; each field is read on its own so a
/// mistyped property never costs the whole feature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeature {
    /// Event ID; usually a string, occasionally numeric in third-party feeds
    #[serde(default)]
    pub id: Option<serde_json::Value>,

    #[serde(default)]
    pub geometry: Option<serde_json::Value>,

    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

/// The subset of USGS properties the explorer reads.
///
/// A field that is missing or has an unusable type reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProperties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Event time (ms since epoch)
    pub time: Option<i64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event page URL
    pub url: Option<String>,
}

impl From<&serde_json::Value> for RawProperties {
    fn from(value: &serde_json::Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        Self {
            mag: value.get("mag").and_then(serde_json::Value::as_f64),
            time: value.get("time").and_then(epoch_millis),
            place: text("place"),
            url: text("url"),
        }
    }
}

/// Integer milliseconds, or a finite float truncated toward zero.
#[allow(clippy::cast_possible_truncation)]
fn epoch_millis(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

/// One normalized seismic event.
///
/// Records are immutable once built by the feed parser; filtering and
/// aggregation always produce new collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Upstream event ID (not deduplicated)
    #[serde(default)]
    pub id: String,

    /// Longitude in degrees
    pub lon: f64,

    /// Latitude in degrees
    pub lat: f64,

    /// Depth in kilometers, positive down
    #[serde(default)]
    pub depth: Option<f64>,

    #[serde(default)]
    pub mag: Option<f64>,

    /// Event time (ms since epoch)
    #[serde(default)]
    pub time: Option<i64>,

    /// Place label, empty when unknown
    #[serde(default)]
    pub place: String,

    /// Link to the upstream event page
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl EventRecord {
    /// Get the event time as a `DateTime<Utc>`.
    #[must_use]
    pub fn time_utc(&self) -> Option<DateTime<Utc>> {
        self.time.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::EventRecord;

    /// Build a record with only the fields a test cares about.
    pub fn record(id: &str, mag: Option<f64>, depth: Option<f64>) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            lon: 0.0,
            lat: 0.0,
            depth,
            mag,
            time: None,
            place: String::new(),
            external_url: None,
        }
    }
}
