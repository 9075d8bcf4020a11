//! Result emitter
//!
//! Serializes the final clip set in a fixed order, `(source_id,
//! start_query_time)` ascending, independent of insertion order. Text lines
//! follow the detection log format:
//!
//! ```text
//! <startQueryTime> <duration> <sourceId> <startSourceTime>
//! ```
//!
//! with two decimals on every number.

use crate::error::{DetectError, DetectResult};
use crate::models::{Clip, DetectionStats};
use crate::workflow::DetectionReport;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(DetectError::Config(format!(
                "unknown output format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

/// One text record
pub fn format_clip(clip: &Clip) -> String {
    format!(
        "{:.2} {:.2} {} {:.2}",
        clip.start_query_time, clip.duration, clip.source_id, clip.start_source_time
    )
}

/// Output order; the trailing keys only separate clips sharing source and start
pub fn output_order(clips: &[Clip]) -> Vec<&Clip> {
    let mut ordered: Vec<&Clip> = clips.iter().collect();
    ordered.sort_by(|a, b| {
        a.source_id
            .cmp(&b.source_id)
            .then(a.start_query_time.total_cmp(&b.start_query_time))
            .then(a.start_source_time.total_cmp(&b.start_source_time))
            .then(a.duration.total_cmp(&b.duration))
    });
    ordered
}

pub fn render_text(clips: &[Clip]) -> String {
    let mut out = String::new();
    for clip in output_order(clips) {
        out.push_str(&format_clip(clip));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    video_id: &'a str,
    generated_at: String,
    clips: Vec<&'a Clip>,
    stats: &'a DetectionStats,
}

pub fn render_json(report: &DetectionReport) -> DetectResult<String> {
    let document = JsonDocument {
        video_id: &report.video_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        clips: output_order(&report.clips),
        stats: &report.stats,
    };
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    Ok(json)
}

pub fn render(report: &DetectionReport, format: OutputFormat) -> DetectResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(&report.clips)),
        OutputFormat::Json => render_json(report),
    }
}

/// Write the rendered report in one scoped operation
///
/// Content goes to a sibling temp file which is then renamed over the
/// target, so a failed run never leaves a partial file behind.
pub fn write_report(
    path: &Path,
    report: &DetectionReport,
    format: OutputFormat,
) -> DetectResult<()> {
    let content = render(report, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DetectError::io(parent, e))?;
    }

    let temp_path = temp_sibling(path);
    if let Err(e) = fs::write(&temp_path, content.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(DetectError::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(DetectError::io(path, e));
    }

    info!("Wrote {} clips to {}", report.clips.len(), path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
