//! Neighbor-set parser
//!
//! Decodes the ANN search log into ticks, one line per tick:
//!
//! ```text
//! <queryTime> $ <sourceId> # <sourceTime> # <frameIndex> | <sourceId> # ... | ...
//! ```
//!
//! `<queryTime>` is either a bare float or a labeled record
//! `<clipId> # <time> # <index>`, in which case the second field is the time.
//! Line order is temporal order and is preserved as-is.

use crate::error::{DetectError, DetectResult};
use crate::models::{Neighbor, NeighborSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

const TICK_SEPARATOR: char = '$';
const RECORD_SEPARATOR: char = '|';
const FIELD_SEPARATOR: char = '#';

/// Malformed neighbor-set record (line numbers are 1-based)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: missing '$' between query time and neighbors")]
    MissingTickSeparator { line: usize },

    #[error("line {line}: more than one '$' separator")]
    ExtraTickSeparator { line: usize },

    #[error("line {line}: neighbor record {record} '{text}' must have 3 '#'-separated fields")]
    MissingFieldSeparator {
        line: usize,
        record: usize,
        text: String,
    },

    #[error("line {line}: neighbor record {record} has an empty source id")]
    EmptySourceId { line: usize, record: usize },

    #[error("line {line}: invalid time '{token}'")]
    InvalidTime { line: usize, token: String },

    #[error("line {line}: invalid frame index '{token}'")]
    InvalidFrameIndex { line: usize, token: String },

    #[error("line {line}: labeled query time '{text}' has no time field")]
    InvalidLabeledTime { line: usize, text: String },
}

/// Parse one line into a tick
pub fn parse_line(text: &str, line: usize) -> Result<NeighborSet, ParseError> {
    let (head, rest) = text
        .split_once(TICK_SEPARATOR)
        .ok_or(ParseError::MissingTickSeparator { line })?;

    if rest.contains(TICK_SEPARATOR) {
        return Err(ParseError::ExtraTickSeparator { line });
    }

    let query_time = parse_query_time(head, line)?;
    let neighbors = parse_neighbors(rest, line)?;

    Ok(NeighborSet {
        query_time,
        neighbors,
        line,
    })
}

/// Parse a whole neighbor log
///
/// Blank lines are skipped. The first malformed line aborts the parse; no
/// partial result is returned.
pub fn parse_str(content: &str) -> Result<Vec<NeighborSet>, ParseError> {
    let mut ticks: Vec<NeighborSet> = Vec::new();

    for (idx, text) in content.lines().enumerate() {
        if text.trim().is_empty() {
            continue;
        }

        let tick = parse_line(text, idx + 1)?;

        if let Some(prev) = ticks.last() {
            if tick.query_time < prev.query_time {
                warn!(
                    "Query time decreases at line {} ({:.2} after {:.2}); keeping input order",
                    tick.line, tick.query_time, prev.query_time
                );
            }
        }

        ticks.push(tick);
    }

    Ok(ticks)
}

/// Read and parse a neighbor log from disk
pub fn read_neighbor_file(path: &Path) -> DetectResult<Vec<NeighborSet>> {
    let content = std::fs::read_to_string(path).map_err(|e| DetectError::io(path, e))?;
    let ticks = parse_str(&content)?;
    debug!("Parsed {} ticks from {}", ticks.len(), path.display());
    Ok(ticks)
}

fn parse_query_time(head: &str, line: usize) -> Result<f64, ParseError> {
    let head = head.trim();

    if head.contains(FIELD_SEPARATOR) {
        let token = head
            .split(FIELD_SEPARATOR)
            .nth(1)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ParseError::InvalidLabeledTime {
                line,
                text: head.to_string(),
            })?;
        return parse_time(token, line);
    }

    parse_time(head, line)
}

fn parse_neighbors(rest: &str, line: usize) -> Result<Vec<Neighbor>, ParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    rest.split(RECORD_SEPARATOR)
        .enumerate()
        .map(|(idx, record)| parse_neighbor(record, line, idx + 1))
        .collect()
}

fn parse_neighbor(record: &str, line: usize, record_no: usize) -> Result<Neighbor, ParseError> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).map(str::trim).collect();

    let [source_id, source_time, frame_index] = fields.as_slice() else {
        return Err(ParseError::MissingFieldSeparator {
            line,
            record: record_no,
            text: record.trim().to_string(),
        });
    };

    if source_id.is_empty() {
        return Err(ParseError::EmptySourceId {
            line,
            record: record_no,
        });
    }

    let source_time = parse_time(source_time, line)?;
    let source_frame_index = frame_index
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidFrameIndex {
            line,
            token: frame_index.to_string(),
        })?;

    Ok(Neighbor {
        source_id: source_id.to_string(),
        source_time,
        source_frame_index,
    })
}

fn parse_time(token: &str, line: usize) -> Result<f64, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| ParseError::InvalidTime {
            line,
            token: token.to_string(),
        })
}
