//! clipscan-seq library interface
//!
//! Reconstructs reused-footage clips from per-instant nearest-neighbor sets.
//!
//! # Pipeline
//! 1. **services::neighbor_parser** - decode neighbor-set lines into ticks
//! 2. **services::candidate_tracker** - advance/spawn/close match hypotheses
//! 3. **validators::clip_validator** - duration and plausibility checks
//! 4. **services::overlap_resolver** - drop shorter overlapping clips
//! 5. **services::result_emitter** - deterministic serialization

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod validators;
pub mod workflow;

pub use crate::error::{DetectError, DetectResult};
pub use crate::models::{Candidate, CandidateState, Clip, DetectionStats, Neighbor, NeighborSet};
pub use crate::workflow::{run_detection, run_file, DetectionParams, DetectionReport};
