//! Service modules for the detection pipeline

pub mod candidate_tracker;
pub mod neighbor_parser;
pub mod overlap_resolver;
pub mod result_emitter;

pub use candidate_tracker::{CandidateTracker, TrackerConfig, TrackerError};
pub use neighbor_parser::{parse_line, parse_str, read_neighbor_file, ParseError};
pub use overlap_resolver::{resolve_overlaps, Resolution};
pub use result_emitter::{format_clip, render, write_report, OutputFormat};
