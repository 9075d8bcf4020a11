//! Nearest-neighbor records produced by the ANN index

use serde::{Deserialize, Serialize};

/// One reference frame returned for a query instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Reference video identifier
    pub source_id: String,
    /// Position of the frame in the reference video (seconds)
    pub source_time: f64,
    /// Sampled-frame index in the reference video
    pub source_frame_index: u64,
}

impl Neighbor {
    pub fn new(source_id: impl Into<String>, source_time: f64, source_frame_index: u64) -> Self {
        Self {
            source_id: source_id.into(),
            source_time,
            source_frame_index,
        }
    }
}

/// One tick: a sampled instant of the derivative plus its neighbors, best first
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborSet {
    /// Position in the derivative video (seconds)
    pub query_time: f64,
    pub neighbors: Vec<Neighbor>,
    /// 1-based input line, diagnostics only (0 when built in code)
    pub line: usize,
}

impl NeighborSet {
    pub fn new(query_time: f64, neighbors: Vec<Neighbor>) -> Self {
        Self {
            query_time,
            neighbors,
            line: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
