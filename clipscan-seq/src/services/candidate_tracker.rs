//! Candidate tracker
//!
//! Folds the tick stream into closed candidates. Each tick runs in two
//! passes over an index-stable `Vec`:
//!
//! 1. Advance every open candidate, then split off those that reached the
//!    consecutive-miss limit.
//! 2. Spawn a candidate for every neighbor whose `(source_id, frame_index)`
//!    is not already expected by an open candidate.
//!
//! A genuine reused segment plays at a fixed rate relative to the
//! derivative, so a candidate's expected frame index moves forward by exactly
//! one per tick whether or not it matched.

use crate::models::{Candidate, CandidateState, NeighborSet};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace};

/// Tracker configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("max_consecutive_misses must be at least 1 (got {0})")]
    InvalidMissLimit(u32),
}

/// Tracker thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Allowed slack between expected and observed frame index
    pub tolerance: u64,
    /// Consecutive missed ticks that close a candidate
    pub max_consecutive_misses: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tolerance: 0,
            max_consecutive_misses: 7,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.max_consecutive_misses == 0 {
            return Err(TrackerError::InvalidMissLimit(self.max_consecutive_misses));
        }
        Ok(())
    }
}

impl Candidate {
    /// Advance one tick and look for this tick's reference frame
    ///
    /// Every in-window neighbor scanned counts as a hit. A lagging match
    /// (index below expected) keeps the scan going in case a later neighbor
    /// is on time, which then replaces the recorded match position. A tick
    /// whose only in-window matches lag is still not a miss.
    ///
    /// A candidate whose expected index cannot move past `u64::MAX` closes.
    pub fn advance(&mut self, tick: &NeighborSet, tolerance: u64) {
        let Some(next) = self.expected_frame_index.checked_add(1) else {
            self.misses += 1;
            self.consecutive_misses += 1;
            self.state = CandidateState::Closed;
            return;
        };
        self.expected_frame_index = next;

        let low = self.expected_frame_index.saturating_sub(tolerance);
        let high = self.expected_frame_index.saturating_add(tolerance);
        let mut matched = false;

        for neighbor in &tick.neighbors {
            if neighbor.source_id != self.source_id
                || !(low..=high).contains(&neighbor.source_frame_index)
            {
                continue;
            }

            matched = true;
            self.hits += 1;
            self.consecutive_misses = 0;
            self.last_match_source_time = neighbor.source_time;
            self.last_match_query_time = tick.query_time;

            if neighbor.source_frame_index >= self.expected_frame_index {
                break;
            }
        }

        if !matched {
            self.misses += 1;
            self.consecutive_misses += 1;
        }
    }
}

/// Stateful fold over ticks; exclusively owns the open candidates
#[derive(Debug)]
pub struct CandidateTracker {
    config: TrackerConfig,
    candidates: Vec<Candidate>,
    ticks: usize,
    spawned: usize,
    closed: usize,
}

impl CandidateTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self {
            config,
            candidates: Vec::new(),
            ticks: 0,
            spawned: 0,
            closed: 0,
        })
    }

    /// Process one tick; returns candidates closed at this tick in spawn order
    pub fn step(&mut self, tick: &NeighborSet) -> Vec<Candidate> {
        self.ticks += 1;

        // Pass 1: advance, then split off exhausted candidates
        let max_misses = self.config.max_consecutive_misses;
        for cand in &mut self.candidates {
            cand.advance(tick, self.config.tolerance);
            if cand.consecutive_misses >= max_misses {
                cand.state = CandidateState::Closed;
            }
            if !cand.is_open() {
                trace!(
                    "Closed {}@{} (hits={}, misses={})",
                    cand.source_id,
                    cand.expected_frame_index,
                    cand.hits,
                    cand.misses
                );
            }
        }

        let (open, closed): (Vec<Candidate>, Vec<Candidate>) =
            std::mem::take(&mut self.candidates)
                .into_iter()
                .partition(Candidate::is_open);
        self.candidates = open;
        self.closed += closed.len();

        // Pass 2: spawn against the post-advance open set
        let spawned = self.spawn_from(tick);
        self.spawned += spawned;

        debug!(
            "Tick {:.2}: {} neighbors, {} open, {} spawned, {} closed",
            tick.query_time,
            tick.neighbors.len(),
            self.candidates.len(),
            spawned,
            closed.len()
        );

        closed
    }

    fn spawn_from(&mut self, tick: &NeighborSet) -> usize {
        let mut fresh = Vec::new();
        {
            let mut expected: HashSet<(&str, u64)> = self
                .candidates
                .iter()
                .map(|c| (c.source_id.as_str(), c.expected_frame_index))
                .collect();

            for neighbor in &tick.neighbors {
                let key = (neighbor.source_id.as_str(), neighbor.source_frame_index);
                if expected.insert(key) {
                    trace!(
                        "Spawned {}@{} at {:.2}",
                        neighbor.source_id,
                        neighbor.source_frame_index,
                        tick.query_time
                    );
                    fresh.push(Candidate::spawn(
                        neighbor.source_id.clone(),
                        neighbor.source_frame_index,
                        neighbor.source_time,
                        tick.query_time,
                    ));
                }
            }
        }

        let count = fresh.len();
        self.candidates.extend(fresh);
        count
    }

    /// Currently open candidates, in spawn order
    pub fn open_candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    pub fn closed(&self) -> usize {
        self.closed
    }

    /// End of stream: open candidates are discarded, returns how many
    pub fn finish(self) -> usize {
        let discarded = self.candidates.len();
        if discarded > 0 {
            debug!("Discarding {} candidates still open at end of stream", discarded);
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Neighbor;

    fn tick(query_time: f64, neighbors: Vec<Neighbor>) -> NeighborSet {
        NeighborSet::new(query_time, neighbors)
    }

    fn tracker(tolerance: u64, max_misses: u32) -> CandidateTracker {
        CandidateTracker::new(TrackerConfig {
            tolerance,
            max_consecutive_misses: max_misses,
        })
        .unwrap()
    }

    #[test]
    fn test_zero_miss_limit_rejected() {
        let result = CandidateTracker::new(TrackerConfig {
            tolerance: 0,
            max_consecutive_misses: 0,
        });
        assert_eq!(result.unwrap_err(), TrackerError::InvalidMissLimit(0));
    }

    #[test]
    fn test_growth_keeps_candidate_open() {
        let mut tracker = tracker(0, 2);
        for t in 0..3u64 {
            let neighbors = vec![Neighbor::new("ep1", t as f64, 10 + t)];
            let closed = tracker.step(&tick(t as f64, neighbors));
            assert!(closed.is_empty());
        }

        let open = tracker.open_candidates();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].expected_frame_index, 12);
        assert_eq!(open[0].hits, 2);
        assert_eq!(open[0].misses, 0);
        assert_eq!(tracker.spawned(), 1);
        assert_eq!(tracker.finish(), 1);
    }

    #[test]
    fn test_expected_index_advances_every_tick() {
        let mut tracker = tracker(0, 100);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 40)]));

        // Alternate hits and misses; the index still moves by one per tick
        for n in 1..=9u64 {
            let neighbors = if n % 2 == 0 {
                vec![Neighbor::new("ep1", n as f64, 40 + n)]
            } else {
                vec![]
            };
            tracker.step(&tick(n as f64, neighbors));
            let cand = &tracker.open_candidates()[0];
            assert_eq!(cand.expected_frame_index, 40 + n);
        }

        let cand = &tracker.open_candidates()[0];
        assert_eq!(cand.hits, 4);
        assert_eq!(cand.misses, 5);
    }

    #[test]
    fn test_closes_exactly_at_miss_limit() {
        let mut tracker = tracker(0, 3);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 5)]));

        assert!(tracker.step(&tick(1.0, vec![])).is_empty());
        assert!(tracker.step(&tick(2.0, vec![])).is_empty());
        let closed = tracker.step(&tick(3.0, vec![]));

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].state, CandidateState::Closed);
        assert_eq!(closed[0].consecutive_misses, 3);
        assert!(tracker.open_candidates().is_empty());
        assert_eq!(tracker.closed(), 1);
    }

    #[test]
    fn test_hit_resets_consecutive_misses() {
        let mut tracker = tracker(0, 2);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 0)]));
        tracker.step(&tick(1.0, vec![]));
        tracker.step(&tick(2.0, vec![Neighbor::new("ep1", 2.0, 2)]));
        let closed = tracker.step(&tick(3.0, vec![]));
        assert!(closed.is_empty());

        let cand = &tracker.open_candidates()[0];
        assert_eq!(cand.consecutive_misses, 1);
        assert_eq!(cand.misses, 2);
        assert_eq!(cand.last_match_query_time, 2.0);
    }

    #[test]
    fn test_tolerance_window() {
        let mut tracker = tracker(1, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        // expected 11, observed 12 is within tolerance 1
        tracker.step(&tick(1.0, vec![Neighbor::new("ep1", 1.5, 12)]));

        let cand = tracker
            .open_candidates()
            .iter()
            .find(|c| c.start_query_time == 0.0)
            .unwrap();
        assert_eq!(cand.hits, 1);
        assert_eq!(cand.last_match_source_time, 1.5);
    }

    #[test]
    fn test_outside_tolerance_is_miss() {
        let mut tracker = tracker(0, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        tracker.step(&tick(1.0, vec![Neighbor::new("ep1", 1.5, 12)]));

        let cand = &tracker.open_candidates()[0];
        assert_eq!(cand.hits, 0);
        assert_eq!(cand.misses, 1);
    }

    #[test]
    fn test_lagging_match_superseded_within_tick() {
        let mut tracker = tracker(1, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        // expected 11: lagging 10 first, then on-time 11
        tracker.step(&tick(
            1.0,
            vec![Neighbor::new("ep1", 0.9, 10), Neighbor::new("ep1", 1.1, 11)],
        ));

        let cand = &tracker.open_candidates()[0];
        assert_eq!(cand.hits, 2);
        assert_eq!(cand.misses, 0);
        assert_eq!(cand.last_match_source_time, 1.1);
        assert_eq!(cand.expected_frame_index, 11);
    }

    #[test]
    fn test_lagging_match_stands_when_alone() {
        let mut tracker = tracker(1, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        tracker.step(&tick(1.0, vec![Neighbor::new("ep1", 0.9, 10)]));

        let cand = tracker
            .open_candidates()
            .iter()
            .find(|c| c.start_query_time == 0.0)
            .unwrap();
        assert_eq!(cand.hits, 1);
        assert_eq!(cand.misses, 0);
        assert_eq!(cand.last_match_source_time, 0.9);
        assert_eq!(cand.last_match_query_time, 1.0);
    }

    #[test]
    fn test_on_time_match_stops_scan() {
        let mut tracker = tracker(1, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        tracker.step(&tick(
            1.0,
            vec![Neighbor::new("ep1", 1.1, 11), Neighbor::new("ep1", 1.2, 12)],
        ));

        let cand = &tracker.open_candidates()[0];
        assert_eq!(cand.last_match_source_time, 1.1);
    }

    #[test]
    fn test_spawn_dedup_against_advanced_candidates() {
        let mut tracker = tracker(0, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        // (ep1, 11) is what the open candidate now expects: no new spawn
        tracker.step(&tick(1.0, vec![Neighbor::new("ep1", 1.0, 11)]));
        assert_eq!(tracker.spawned(), 1);
        assert_eq!(tracker.open_candidates().len(), 1);
    }

    #[test]
    fn test_duplicate_neighbors_in_one_tick_spawn_once() {
        let mut tracker = tracker(0, 5);
        tracker.step(&tick(
            0.0,
            vec![
                Neighbor::new("ep1", 0.0, 10),
                Neighbor::new("ep1", 0.0, 10),
                Neighbor::new("ep2", 0.0, 10),
            ],
        ));
        assert_eq!(tracker.spawned(), 2);
    }

    #[test]
    fn test_closed_candidate_slot_can_respawn() {
        let mut tracker = tracker(0, 1);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        // candidate expects 11, misses, closes; the neighbor 11 then spawns anew
        let closed = tracker.step(&tick(1.0, vec![Neighbor::new("ep2", 1.0, 11)]));
        assert_eq!(closed.len(), 1);
        assert_eq!(tracker.open_candidates().len(), 1);
        assert_eq!(tracker.open_candidates()[0].source_id, "ep2");
    }

    #[test]
    fn test_on_time_match_ends_hit_counting() {
        let mut tracker = tracker(1, 5);
        tracker.step(&tick(0.0, vec![Neighbor::new("ep1", 0.0, 10)]));
        // expected 11: lagging, on time, then one that is never scanned
        tracker.step(&tick(
            1.0,
            vec![
                Neighbor::new("ep1", 0.9, 10),
                Neighbor::new("ep1", 1.1, 11),
                Neighbor::new("ep1", 1.2, 12),
            ],
        ));

        let cand = tracker
            .open_candidates()
            .iter()
            .find(|c| c.start_query_time == 0.0)
            .unwrap();
        assert_eq!(cand.hits, 2);
        assert_eq!(cand.last_match_source_time, 1.1);
    }

    #[test]
    fn test_max_frame_index_closes_instead_of_overflowing() {
        let ticks = crate::services::parse_str(
            "0 $ ep1 # 0 # 18446744073709551615\n1 $ ep2 # 1 # 1\n",
        )
        .unwrap();
        let mut tracker = tracker(0, 5);

        assert!(tracker.step(&ticks[0]).is_empty());
        let closed = tracker.step(&ticks[1]);

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].source_id, "ep1");
        assert_eq!(closed[0].expected_frame_index, u64::MAX);
        assert_eq!(closed[0].state, CandidateState::Closed);
        assert_eq!(tracker.open_candidates().len(), 1);
        assert_eq!(tracker.open_candidates()[0].source_id, "ep2");
    }

    #[test]
    fn test_tolerance_low_bound_saturates() {
        let mut cand = Candidate::spawn("ep1", 0, 0.0, 0.0);
        let t = tick(1.0, vec![Neighbor::new("ep1", 0.0, 0)]);
        cand.advance(&t, 5);
        assert_eq!(cand.hits, 1);
        assert_eq!(cand.expected_frame_index, 1);
    }
}
