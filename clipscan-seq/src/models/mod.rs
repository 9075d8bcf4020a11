//! Data models for clipscan-seq
//!
//! - Neighbor / NeighborSet: one tick of nearest-neighbor output
//! - Candidate: in-progress match hypothesis owned by the tracker
//! - Clip: validated, terminal match
//! - DetectionStats: run counters

pub mod candidate;
pub mod clip;
pub mod neighbor;
pub mod stats;

pub use candidate::{Candidate, CandidateState};
pub use clip::Clip;
pub use neighbor::{Neighbor, NeighborSet};
pub use stats::DetectionStats;
