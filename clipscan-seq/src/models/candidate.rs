//! Match hypothesis state
//!
//! A candidate claims that, starting at `start_query_time`, the derivative
//! replays `source_id` from `start_source_time` onward at one reference frame
//! per tick. Advancing and closing live in the candidate tracker.

/// Candidate lifecycle: Open → Closed (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub source_id: String,
    /// Reference frame index this candidate expects at the current tick
    pub expected_frame_index: u64,
    pub start_source_time: f64,
    pub start_query_time: f64,
    pub last_match_source_time: f64,
    pub last_match_query_time: f64,
    pub hits: u32,
    pub misses: u32,
    pub consecutive_misses: u32,
    pub state: CandidateState,
}

impl Candidate {
    /// Seed a new open candidate at a neighbor observed at `query_time`
    pub fn spawn(
        source_id: impl Into<String>,
        frame_index: u64,
        source_time: f64,
        query_time: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            expected_frame_index: frame_index,
            start_source_time: source_time,
            start_query_time: query_time,
            last_match_source_time: source_time,
            last_match_query_time: query_time,
            hits: 0,
            misses: 0,
            consecutive_misses: 0,
            state: CandidateState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == CandidateState::Open
    }

    /// Query-time span from seed to last match (zero if never matched)
    pub fn duration(&self) -> f64 {
        self.last_match_query_time - self.start_query_time
    }
}
