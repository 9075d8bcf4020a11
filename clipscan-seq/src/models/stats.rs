//! Run statistics

use serde::{Deserialize, Serialize};

/// Counters collected over one detection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub ticks: usize,
    pub candidates_spawned: usize,
    pub candidates_closed: usize,
    pub clips_accepted: usize,
    /// Closed candidates whose duration did not exceed the minimum
    pub rejected_too_short: usize,
    /// Closed candidates failing the plausibility predicate
    pub rejected_implausible: usize,
    pub removed_overlapping: usize,
    /// Candidates still open when the stream ended
    pub open_discarded: usize,
    pub clips_emitted: usize,
}
