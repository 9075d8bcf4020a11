//! clipscan-seq - reused-footage sequence detector
//!
//! Reads a nearest-neighbor log (one line per sampled instant of the
//! derivative video), reconstructs contiguous matches against the reference
//! corpus and writes one clip per line:
//!
//! ```text
//! <startQueryTime> <duration> <sourceId> <startSourceTime>
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clipscan_common::config::load_config;
use clipscan_common::logging::init_logging;
use clipscan_seq::config::{
    resolve_format, resolve_output, resolve_params, CliOverrides, OutputTarget,
};
use clipscan_seq::services::{read_neighbor_file, render, write_report};
use clipscan_seq::workflow::{derive_video_id, Pipeline};
use tracing::info;

/// Command-line arguments for clipscan-seq
#[derive(Parser, Debug)]
#[command(name = "clipscan-seq")]
#[command(about = "Detect reused footage from nearest-neighbor search logs")]
#[command(version)]
struct Args {
    /// Neighbor log produced by the ANN search
    neighbors: PathBuf,

    /// Write results to this file (default: stdout)
    #[arg(short, long, env = "CLIPSCAN_OUTPUT", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write results to <DIR>/<video-id>.<ext>
    #[arg(long, value_name = "DIR", env = "CLIPSCAN_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Derivative video identifier (default: neighbor log file stem)
    #[arg(long)]
    video_id: Option<String>,

    /// Frame-index matching slack
    #[arg(short, long, env = "CLIPSCAN_TOLERANCE")]
    tolerance: Option<u64>,

    /// Consecutive missed ticks that end a candidate
    #[arg(short = 'm', long, env = "CLIPSCAN_MAX_CONSECUTIVE_MISSES")]
    max_consecutive_misses: Option<u32>,

    /// Minimum clip duration in seconds (exclusive)
    #[arg(short = 'd', long, env = "CLIPSCAN_MIN_DURATION")]
    min_duration: Option<f64>,

    /// Validator preset: standard, half-ratio, miss-budget
    #[arg(long, env = "CLIPSCAN_PRESET")]
    preset: Option<String>,

    /// Override the preset's accuracy factor
    #[arg(long, env = "CLIPSCAN_ACCURACY_FACTOR")]
    accuracy_factor: Option<f64>,

    /// Override the preset's miss allowance (number or "max-consecutive")
    #[arg(long, env = "CLIPSCAN_MISS_ALLOWANCE")]
    miss_allowance: Option<String>,

    /// Output format: text or json
    #[arg(short, long, env = "CLIPSCAN_FORMAT")]
    format: Option<String>,

    /// TOML config file (default: platform config dir)
    #[arg(short, long, env = "CLIPSCAN_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tolerance: self.tolerance,
            max_consecutive_misses: self.max_consecutive_misses,
            min_duration: self.min_duration,
            preset: self.preset.clone(),
            accuracy_factor: self.accuracy_factor,
            miss_allowance: self.miss_allowance.clone(),
            output: self.output.clone(),
            output_dir: self.output_dir.clone(),
            format: self.format.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, config_path) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&toml_config.logging)?;

    // load_config runs before the subscriber exists
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("No config file found, using compiled defaults"),
    }

    // Everything is validated before the input file is touched
    let overrides = args.overrides();
    let params = resolve_params(&overrides, &toml_config.detection)
        .context("Invalid detection parameters")?;
    let format = resolve_format(&overrides, &toml_config.output)?;
    let pipeline = Pipeline::from_params(&params)?;

    let video_id = args
        .video_id
        .clone()
        .unwrap_or_else(|| derive_video_id(&args.neighbors));
    let target = resolve_output(&overrides, &toml_config.output, &video_id, format);

    info!(
        "Searching for clips in {} (tolerance={}, max_consecutive_misses={}, \
         min_duration={:.2}, preset={})",
        video_id,
        params.tolerance,
        params.max_consecutive_misses,
        params.min_duration,
        params.preset
    );

    let ticks = read_neighbor_file(&args.neighbors)
        .with_context(|| format!("Failed to read {}", args.neighbors.display()))?;
    let report = pipeline.run(&video_id, &ticks)?;

    match target {
        OutputTarget::File(path) => write_report(&path, &report, format)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        OutputTarget::Stdout => {
            let content = render(&report, format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
