//! Summary statistics and fixed-bucket histograms over the active records.
//!
//! Everything here is a single pass over the input and never fails: absent
//! fields are excluded rather than reported.

use serde::Serialize;

use crate::models::EventRecord;

/// Scalar summary of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub max_magnitude: Option<f64>,
    /// Sum of present depths divided by `count`, absent depths included in
    /// the denominator.
    pub mean_depth: Option<f64>,
    pub latest_time: Option<i64>,
}

/// Compute the summary of `records`.
#[must_use]
pub fn summarize(records: &[EventRecord]) -> Summary {
    let count = records.len();
    if count == 0 {
        return Summary::default();
    }

    let mut max_magnitude: Option<f64> = None;
    let mut depth_sum = 0.0;
    let mut latest_time: Option<i64> = None;

    for rec in records {
        if let Some(m) = rec.mag {
            max_magnitude = Some(max_magnitude.map_or(m, |cur| cur.max(m)));
        }
        if let Some(d) = rec.depth {
            depth_sum += d;
        }
        if let Some(t) = rec.time {
            latest_time = Some(latest_time.map_or(t, |cur| cur.max(t)));
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mean_depth = Some(depth_sum / count as f64);

    Summary {
        count,
        max_magnitude,
        mean_depth,
        latest_time,
    }
}

/// One histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub label: &'static str,
    pub lower_bound: f64,
    /// `None` means unbounded
    pub upper_bound: Option<f64>,
    pub count: usize,
}

/// Which field a histogram bins, and with which edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSchema {
    /// [0,2) [2,4) [4,6) [6,∞)
    Magnitude,
    /// [0,70) [70,300) [300,∞)
    Depth,
}

impl BucketSchema {
    /// `(label, lower, upper)` for each bucket in emission order.
    #[must_use]
    pub const fn edges(self) -> &'static [(&'static str, f64, Option<f64>)] {
        match self {
            Self::Magnitude => &[
                ("0–2", 0.0, Some(2.0)),
                ("2–4", 2.0, Some(4.0)),
                ("4–6", 4.0, Some(6.0)),
                ("6+", 6.0, None),
            ],
            Self::Depth => &[
                ("0–70", 0.0, Some(70.0)),
                ("70–300", 70.0, Some(300.0)),
                ("300+", 300.0, None),
            ],
        }
    }

    fn value(self, rec: &EventRecord) -> Option<f64> {
        match self {
            Self::Magnitude => rec.mag,
            Self::Depth => rec.depth,
        }
    }
}

/// Count `records` into the buckets of `schema`.
///
/// Records whose field is absent or negative are skipped. All buckets are
/// returned, zero-count ones included.
#[must_use]
pub fn bucketize(records: &[EventRecord], schema: BucketSchema) -> Vec<HistogramBucket> {
    let edges = schema.edges();
    let mut counts = vec![0usize; edges.len()];

    for value in records.iter().filter_map(|r| schema.value(r)) {
        if value < 0.0 || value.is_nan() {
            continue;
        }
        let slot = edges
            .iter()
            .position(|&(_, lo, hi)| value >= lo && hi.is_none_or(|h| value < h));
        if let Some(i) = slot {
            counts[i] += 1;
        }
    }

    edges
        .iter()
        .zip(counts)
        .map(|(&(label, lower_bound, upper_bound), count)| HistogramBucket {
            label,
            lower_bound,
            upper_bound,
            count,
        })
        .collect()
}
