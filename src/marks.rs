//! How a point mark looks for a given magnitude.
//!
//! The renderer draws these; the terminal output reuses the same tiers so a
//! red line in the CLI is a red dot on the map.

use serde::Serialize;

use crate::models::EventRecord;

/// Smallest point radius in metres.
const MIN_RADIUS_M: f64 = 15_000.0;

/// Radius growth per unit magnitude, in metres.
const RADIUS_PER_MAG_M: f64 = 25_000.0;

/// Magnitude assumed for sizing when a record has none.
const FALLBACK_SIZE_MAG: f64 = 2.0;

/// Colour tier of a point mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeTier {
    /// mag >= 6
    Major,
    /// 4 <= mag < 6
    Moderate,
    /// below 4, or unknown
    Minor,
}

impl MagnitudeTier {
    #[must_use]
    pub fn for_magnitude(mag: Option<f64>) -> Self {
        match mag {
            Some(m) if m >= 6.0 => Self::Major,
            Some(m) if m >= 4.0 => Self::Moderate,
            _ => Self::Minor,
        }
    }

    /// RGBA fill.
    #[must_use]
    pub const fn fill(self) -> [u8; 4] {
        match self {
            Self::Major => [220, 60, 60, 190],
            Self::Moderate => [240, 160, 60, 190],
            Self::Minor => [80, 180, 220, 170],
        }
    }
}

/// Size and colour of one point mark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkStyle {
    pub radius_m: f64,
    pub tier: MagnitudeTier,
    pub fill: [u8; 4],
}

impl MarkStyle {
    #[must_use]
    pub fn for_magnitude(mag: Option<f64>) -> Self {
        let radius_m = (mag.unwrap_or(FALLBACK_SIZE_MAG) * RADIUS_PER_MAG_M).max(MIN_RADIUS_M);
        let tier = MagnitudeTier::for_magnitude(mag);
        Self {
            radius_m,
            tier,
            fill: tier.fill(),
        }
    }
}

/// A record paired with its style, as handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct Mark<'a> {
    #[serde(flatten)]
    pub record: &'a EventRecord,
    pub style: MarkStyle,
}

impl<'a> From<&'a EventRecord> for Mark<'a> {
    fn from(record: &'a EventRecord) -> Self {
        Self {
            record,
            style: MarkStyle::for_magnitude(record.mag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    #[test]
    fn test_tiers() {
        assert_eq!(MagnitudeTier::for_magnitude(Some(6.0)), MagnitudeTier::Major);
        assert_eq!(MagnitudeTier::for_magnitude(Some(5.99)), MagnitudeTier::Moderate);
        assert_eq!(MagnitudeTier::for_magnitude(Some(4.0)), MagnitudeTier::Moderate);
        assert_eq!(MagnitudeTier::for_magnitude(Some(3.9)), MagnitudeTier::Minor);
        assert_eq!(MagnitudeTier::for_magnitude(None), MagnitudeTier::Minor);
    }

    #[test]
    fn test_radius_monotonic_with_floor() {
        assert_eq!(MarkStyle::for_magnitude(Some(0.1)).radius_m, MIN_RADIUS_M);
        assert_eq!(MarkStyle::for_magnitude(None).radius_m, 50_000.0);

        let mut last = 0.0;
        for tenth in 0..90 {
            let r = MarkStyle::for_magnitude(Some(f64::from(tenth) / 10.0)).radius_m;
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn test_mark_flattens_record() {
        let rec = record("us9", Some(6.3), Some(12.0));
        let json = serde_json::to_value(Mark::from(&rec)).unwrap();
        assert_eq!(json["id"], "us9");
        assert_eq!(json["style"]["tier"], "major");
        assert_eq!(json["style"]["fill"][0], 220);
    }
}
