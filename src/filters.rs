//! Event filtering logic.
//!
//! A record passes when its magnitude clears the floor and its depth sits in
//! the closed `[min_depth, max_depth]` range. An absent field never satisfies
//! a bound, so records without a magnitude or depth are always excluded.

use serde::{Deserialize, Serialize};

use crate::models::EventRecord;

/// Default magnitude floor.
pub const DEFAULT_MIN_MAGNITUDE: f64 = 2.5;

/// Default shallowest depth (km).
pub const DEFAULT_MIN_DEPTH: f64 = 0.0;

/// Default deepest depth (km).
pub const DEFAULT_MAX_DEPTH: f64 = 700.0;

/// Combined filter criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub min_magnitude: f64,
    pub min_depth: f64,
    pub max_depth: f64,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            min_depth: DEFAULT_MIN_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EventFilter {
    /// Check if an event passes all filter criteria.
    #[must_use]
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.check_magnitude(event) && self.check_depth(event)
    }

    /// Keep the matching records, in input order.
    #[must_use]
    pub fn apply(&self, records: &[EventRecord]) -> Vec<EventRecord> {
        records.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    fn check_magnitude(&self, event: &EventRecord) -> bool {
        event.mag.is_some_and(|m| m >= self.min_magnitude)
    }

    fn check_depth(&self, event: &EventRecord) -> bool {
        event
            .depth
            .is_some_and(|d| d >= self.min_depth && d <= self.max_depth)
    }
}
