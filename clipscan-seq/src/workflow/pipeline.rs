//! Detection pipeline orchestrator

use crate::error::{DetectError, DetectResult};
use crate::models::{Clip, DetectionStats, NeighborSet};
use crate::services::candidate_tracker::{CandidateTracker, TrackerConfig};
use crate::services::neighbor_parser::read_neighbor_file;
use crate::services::overlap_resolver::resolve_overlaps;
use crate::validators::{
    AcceptancePolicy, ClipValidator, MissAllowance, RatioPolicy, ValidatorPreset, Verdict,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Validated run parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    pub tolerance: u64,
    pub max_consecutive_misses: u32,
    /// Seconds; a clip must last strictly longer
    pub min_duration: f64,
    pub preset: ValidatorPreset,
    /// Overrides the preset's factor
    pub accuracy_factor: Option<f64>,
    /// Overrides the preset's allowance
    pub miss_allowance: Option<MissAllowance>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            tolerance: 0,
            max_consecutive_misses: 7,
            min_duration: 1.0,
            preset: ValidatorPreset::Standard,
            accuracy_factor: None,
            miss_allowance: None,
        }
    }
}

impl DetectionParams {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            tolerance: self.tolerance,
            max_consecutive_misses: self.max_consecutive_misses,
        }
    }

    /// Preset formula with explicit overrides applied
    pub fn policy(&self) -> DetectResult<RatioPolicy> {
        let base = self.preset.policy();
        RatioPolicy::new(
            self.accuracy_factor.unwrap_or(base.accuracy_factor),
            self.miss_allowance.unwrap_or(base.miss_allowance),
        )
        .map_err(|e| DetectError::Config(e.to_string()))
    }

    /// Reject bad parameters before any input is read
    pub fn validate(&self) -> DetectResult<()> {
        Pipeline::from_params(self).map(|_| ())
    }
}

/// Final result of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub video_id: String,
    /// Surviving clips in canonical order
    pub clips: Vec<Clip>,
    pub stats: DetectionStats,
}

/// Tracker settings plus a validator, ready to fold a tick stream
#[derive(Debug)]
pub struct Pipeline {
    tracker_config: TrackerConfig,
    validator: ClipValidator,
}

impl Pipeline {
    pub fn new(
        tracker_config: TrackerConfig,
        min_duration: f64,
        policy: Box<dyn AcceptancePolicy>,
    ) -> DetectResult<Self> {
        tracker_config
            .validate()
            .map_err(|e| DetectError::Config(e.to_string()))?;
        let validator = ClipValidator::new(
            min_duration,
            tracker_config.max_consecutive_misses,
            policy,
        )
        .map_err(|e| DetectError::Config(e.to_string()))?;

        Ok(Self {
            tracker_config,
            validator,
        })
    }

    pub fn from_params(params: &DetectionParams) -> DetectResult<Self> {
        let policy = params.policy()?;
        Self::new(params.tracker_config(), params.min_duration, Box::new(policy))
    }

    pub fn run(&self, video_id: &str, ticks: &[NeighborSet]) -> DetectResult<DetectionReport> {
        let mut tracker = CandidateTracker::new(self.tracker_config)
            .map_err(|e| DetectError::Config(e.to_string()))?;
        let mut stats = DetectionStats::default();
        let mut accepted = Vec::new();

        for tick in ticks {
            for candidate in tracker.step(tick) {
                match self.validator.validate(candidate) {
                    Verdict::Accepted(clip) => accepted.push(clip),
                    Verdict::TooShort { .. } => stats.rejected_too_short += 1,
                    Verdict::Implausible { hits, misses } => {
                        debug!("Rejected implausible candidate (hits={}, misses={})", hits, misses);
                        stats.rejected_implausible += 1;
                    }
                }
            }
        }

        stats.ticks = tracker.ticks();
        stats.candidates_spawned = tracker.spawned();
        stats.candidates_closed = tracker.closed();
        stats.clips_accepted = accepted.len();
        stats.open_discarded = tracker.finish();

        let resolution = resolve_overlaps(accepted);
        stats.removed_overlapping = resolution.removed.len();
        stats.clips_emitted = resolution.kept.len();

        info!(
            "{}: {} ticks, {} candidates, {} accepted, {} after overlap resolution ({})",
            video_id,
            stats.ticks,
            stats.candidates_spawned,
            stats.clips_accepted,
            stats.clips_emitted,
            self.validator.policy().describe()
        );

        Ok(DetectionReport {
            video_id: video_id.to_string(),
            clips: resolution.kept,
            stats,
        })
    }
}

/// Run the full pipeline over already-parsed ticks
pub fn run_detection(
    video_id: &str,
    ticks: &[NeighborSet],
    params: &DetectionParams,
) -> DetectResult<DetectionReport> {
    Pipeline::from_params(params)?.run(video_id, ticks)
}

/// Parse a neighbor log and run the pipeline over it
///
/// Parameters are checked before the file is opened.
pub fn run_file(
    path: &Path,
    video_id: Option<&str>,
    params: &DetectionParams,
) -> DetectResult<DetectionReport> {
    let pipeline = Pipeline::from_params(params)?;
    let video_id = match video_id {
        Some(id) => id.to_string(),
        None => derive_video_id(path),
    };

    info!("Searching for clips in {}", video_id);
    let ticks = read_neighbor_file(path)?;
    pipeline.run(&video_id, &ticks)
}

/// Video identifier from the neighbor log's file stem
pub fn derive_video_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "video".to_string())
}
