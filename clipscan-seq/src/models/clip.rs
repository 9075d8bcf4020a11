//! Validated clip match

use serde::{Deserialize, Serialize};

/// A validated temporal match between the derivative and a reference source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub source_id: String,
    pub start_source_time: f64,
    pub start_query_time: f64,
    /// Query-time length (seconds)
    pub duration: f64,
    pub hits: u32,
    pub misses: u32,
}

impl Clip {
    /// Exclusive end of the query-time interval
    pub fn end_query_time(&self) -> f64 {
        self.start_query_time + self.duration
    }

    /// Same source and intersecting `[start, start + duration)` intervals
    ///
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.source_id == other.source_id
            && self.start_query_time < other.end_query_time()
            && other.start_query_time < self.end_query_time()
    }
}
