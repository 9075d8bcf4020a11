//! Run-parameter resolution for clipscan-seq
//!
//! **Priority:** command line / environment → TOML → compiled default
//!
//! Command-line flags and their `CLIPSCAN_*` environment fallbacks arrive
//! together through clap; this module layers them over the TOML file and
//! validates the result before any input is read.

use crate::error::{DetectError, DetectResult};
use crate::services::result_emitter::OutputFormat;
use crate::validators::{MissAllowance, ValidatorPreset};
use crate::workflow::DetectionParams;
use clipscan_common::config::{DetectionSection, OutputSection};
use std::path::PathBuf;
use tracing::debug;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub tolerance: Option<u64>,
    pub max_consecutive_misses: Option<u32>,
    pub min_duration: Option<f64>,
    pub preset: Option<String>,
    pub accuracy_factor: Option<f64>,
    pub miss_allowance: Option<String>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
}

/// Where the report goes
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// First present value wins; logs the tier it came from
fn pick<T: Clone + std::fmt::Debug>(
    name: &str,
    cli: Option<&T>,
    toml: Option<&T>,
    default: T,
) -> T {
    if let Some(v) = cli {
        debug!("{} = {:?} (command line/environment)", name, v);
        return v.clone();
    }
    if let Some(v) = toml {
        debug!("{} = {:?} (TOML)", name, v);
        return v.clone();
    }
    debug!("{} = {:?} (default)", name, default);
    default
}

/// Layer CLI over TOML over defaults and validate
pub fn resolve_params(
    cli: &CliOverrides,
    toml: &DetectionSection,
) -> DetectResult<DetectionParams> {
    let defaults = DetectionParams::default();

    let preset = match cli.preset.as_ref().or(toml.preset.as_ref()) {
        Some(name) => name
            .parse::<ValidatorPreset>()
            .map_err(|e| DetectError::Config(e.to_string()))?,
        None => defaults.preset,
    };

    let miss_allowance = match cli.miss_allowance.as_ref().or(toml.miss_allowance.as_ref()) {
        Some(raw) => Some(
            raw.parse::<MissAllowance>()
                .map_err(|e| DetectError::Config(e.to_string()))?,
        ),
        None => None,
    };

    let params = DetectionParams {
        tolerance: pick(
            "tolerance",
            cli.tolerance.as_ref(),
            toml.tolerance.as_ref(),
            defaults.tolerance,
        ),
        max_consecutive_misses: pick(
            "max_consecutive_misses",
            cli.max_consecutive_misses.as_ref(),
            toml.max_consecutive_misses.as_ref(),
            defaults.max_consecutive_misses,
        ),
        min_duration: pick(
            "min_duration",
            cli.min_duration.as_ref(),
            toml.min_duration.as_ref(),
            defaults.min_duration,
        ),
        preset,
        accuracy_factor: cli.accuracy_factor.or(toml.accuracy_factor),
        miss_allowance,
    };

    params.validate()?;
    Ok(params)
}

pub fn resolve_format(cli: &CliOverrides, toml: &OutputSection) -> DetectResult<OutputFormat> {
    match cli.format.as_ref().or(toml.format.as_ref()) {
        Some(raw) => raw.parse(),
        None => Ok(OutputFormat::default()),
    }
}

/// Explicit `--output` wins; else `<dir>/<video_id>.<ext>` when a directory
/// is configured; else stdout
pub fn resolve_output(
    cli: &CliOverrides,
    toml: &OutputSection,
    video_id: &str,
    format: OutputFormat,
) -> OutputTarget {
    if let Some(path) = &cli.output {
        return OutputTarget::File(path.clone());
    }

    match cli.output_dir.as_ref().or(toml.dir.as_ref()) {
        Some(dir) => OutputTarget::File(dir.join(format!("{}.{}", video_id, format.extension()))),
        None => OutputTarget::Stdout,
    }
}
