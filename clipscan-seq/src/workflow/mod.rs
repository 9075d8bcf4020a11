//! Detection workflow
//!
//! Strictly linear, single pass:
//! 1. Parse the complete neighbor log (abort on the first malformed line)
//! 2. Fold ticks through the candidate tracker
//! 3. Validate each closed candidate into a clip, or drop it
//! 4. Resolve overlaps over the full accepted set
//!
//! Emission is left to the caller so the report is written in one scoped
//! operation after the computation finished.

pub mod pipeline;

pub use pipeline::{
    derive_video_id, run_detection, run_file, DetectionParams, DetectionReport, Pipeline,
};
