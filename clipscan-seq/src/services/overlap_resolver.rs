//! Overlap resolver
//!
//! Removes redundant clips: whenever two clips on the same source overlap in
//! query time, the shorter one is dropped. Every overlapping pair nominates
//! its own loser; a clip beaten by any single overlapping clip is removed even
//! if that winner is itself removed by a third clip.
//!
//! Tie-break for equal durations, in order: earlier `start_query_time`,
//! earlier `start_source_time`, earlier position in canonical order.

use crate::models::Clip;
use std::cmp::Ordering;
use tracing::debug;

/// Resolver output, both halves in canonical order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub kept: Vec<Clip>,
    pub removed: Vec<Clip>,
}

/// Canonical comparison order: source, start, longer first, source start
pub fn canonical_order(a: &Clip, b: &Clip) -> Ordering {
    a.source_id
        .cmp(&b.source_id)
        .then(a.start_query_time.total_cmp(&b.start_query_time))
        .then(b.duration.total_cmp(&a.duration))
        .then(a.start_source_time.total_cmp(&b.start_source_time))
}

/// True when `a` (earlier in canonical order) survives a conflict with `b`
fn survives(a: &Clip, b: &Clip) -> bool {
    let rank = b
        .duration
        .total_cmp(&a.duration)
        .then(a.start_query_time.total_cmp(&b.start_query_time))
        .then(a.start_source_time.total_cmp(&b.start_source_time));
    rank != Ordering::Greater
}

pub fn resolve_overlaps(mut clips: Vec<Clip>) -> Resolution {
    clips.sort_by(canonical_order);
    let mut losers = vec![false; clips.len()];

    for i in 0..clips.len() {
        let end = clips[i].end_query_time();

        for j in (i + 1)..clips.len() {
            // Sorted by source then start: nothing past here can overlap clip i
            if clips[j].source_id != clips[i].source_id || clips[j].start_query_time >= end {
                break;
            }
            if !clips[i].overlaps(&clips[j]) {
                continue;
            }

            let loser = if survives(&clips[i], &clips[j]) { j } else { i };
            losers[loser] = true;
        }
    }

    let mut resolution = Resolution::default();
    for (clip, lost) in clips.into_iter().zip(losers) {
        if lost {
            resolution.removed.push(clip);
        } else {
            resolution.kept.push(clip);
        }
    }

    debug!(
        "Overlap resolution kept {} clips, removed {}",
        resolution.kept.len(),
        resolution.removed.len()
    );

    resolution
}
