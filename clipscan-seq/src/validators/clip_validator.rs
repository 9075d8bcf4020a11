//! Clip validator
//!
//! Turns a closed candidate into a clip when two things hold:
//! - its query-time duration exceeds the configured minimum (exclusive)
//! - an injectable plausibility policy accepts its hit/miss evidence
//!
//! Rejected candidates are dropped with no further effect.

use crate::models::{Candidate, Clip};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validator configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidatorError {
    #[error("min_duration must be a finite value >= 0 (got {0})")]
    InvalidMinDuration(f64),

    #[error("accuracy_factor must be finite and >= 0 (got {0})")]
    InvalidAccuracyFactor(f64),

    #[error("miss_allowance must be finite (got {0})")]
    InvalidMissAllowance(f64),

    #[error("unknown validator preset '{0}' (expected standard, half-ratio or miss-budget)")]
    UnknownPreset(String),

    #[error("invalid miss allowance '{0}' (expected a number or max-consecutive)")]
    UnparsableMissAllowance(String),
}

/// Evidence handed to an acceptance policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchEvidence {
    pub hits: u32,
    pub misses: u32,
    pub max_consecutive_misses: u32,
}

/// Plausibility predicate over a closed candidate's evidence
pub trait AcceptancePolicy: Send + Sync {
    fn accepts(&self, evidence: &MatchEvidence) -> bool;

    /// Human-readable form for logs
    fn describe(&self) -> String {
        "custom policy".to_string()
    }
}

impl<F> AcceptancePolicy for F
where
    F: Fn(&MatchEvidence) -> bool + Send + Sync,
{
    fn accepts(&self, evidence: &MatchEvidence) -> bool {
        self(evidence)
    }
}

/// Slack subtracted from the miss count before comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissAllowance {
    Fixed(f64),
    /// Use the run's `max_consecutive_misses`; the closing streak is forgiven
    MaxConsecutiveMisses,
}

impl MissAllowance {
    fn resolve(&self, evidence: &MatchEvidence) -> f64 {
        match self {
            MissAllowance::Fixed(v) => *v,
            MissAllowance::MaxConsecutiveMisses => f64::from(evidence.max_consecutive_misses),
        }
    }
}

impl FromStr for MissAllowance {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("max-consecutive") {
            return Ok(MissAllowance::MaxConsecutiveMisses);
        }
        s.parse::<f64>()
            .map(MissAllowance::Fixed)
            .map_err(|_| ValidatorError::UnparsableMissAllowance(s.to_string()))
    }
}

impl fmt::Display for MissAllowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissAllowance::Fixed(v) => write!(f, "{}", v),
            MissAllowance::MaxConsecutiveMisses => write!(f, "max_consecutive_misses"),
        }
    }
}

/// `accuracy_factor * hits >= misses - allowance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioPolicy {
    pub accuracy_factor: f64,
    pub miss_allowance: MissAllowance,
}

impl RatioPolicy {
    pub fn new(
        accuracy_factor: f64,
        miss_allowance: MissAllowance,
    ) -> Result<Self, ValidatorError> {
        if !accuracy_factor.is_finite() || accuracy_factor < 0.0 {
            return Err(ValidatorError::InvalidAccuracyFactor(accuracy_factor));
        }
        if let MissAllowance::Fixed(v) = miss_allowance {
            if !v.is_finite() {
                return Err(ValidatorError::InvalidMissAllowance(v));
            }
        }
        Ok(Self {
            accuracy_factor,
            miss_allowance,
        })
    }
}

impl Default for RatioPolicy {
    fn default() -> Self {
        ValidatorPreset::Standard.policy()
    }
}

impl AcceptancePolicy for RatioPolicy {
    fn accepts(&self, evidence: &MatchEvidence) -> bool {
        let lhs = self.accuracy_factor * f64::from(evidence.hits);
        let rhs = f64::from(evidence.misses) - self.miss_allowance.resolve(evidence);
        lhs >= rhs
    }

    fn describe(&self) -> String {
        format!("{} * hits >= misses - {}", self.accuracy_factor, self.miss_allowance)
    }
}

/// Named acceptance formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidatorPreset {
    /// `3 * hits >= misses`
    #[default]
    Standard,
    /// `2 * hits >= misses`
    HalfRatio,
    /// `3 * hits >= misses - max_consecutive_misses`
    MissBudget,
}

impl ValidatorPreset {
    pub fn policy(&self) -> RatioPolicy {
        match self {
            ValidatorPreset::Standard => RatioPolicy {
                accuracy_factor: 3.0,
                miss_allowance: MissAllowance::Fixed(0.0),
            },
            ValidatorPreset::HalfRatio => RatioPolicy {
                accuracy_factor: 2.0,
                miss_allowance: MissAllowance::Fixed(0.0),
            },
            ValidatorPreset::MissBudget => RatioPolicy {
                accuracy_factor: 3.0,
                miss_allowance: MissAllowance::MaxConsecutiveMisses,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorPreset::Standard => "standard",
            ValidatorPreset::HalfRatio => "half-ratio",
            ValidatorPreset::MissBudget => "miss-budget",
        }
    }
}

impl FromStr for ValidatorPreset {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ValidatorPreset::Standard),
            "half-ratio" => Ok(ValidatorPreset::HalfRatio),
            "miss-budget" => Ok(ValidatorPreset::MissBudget),
            other => Err(ValidatorError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for ValidatorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one closed candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(Clip),
    TooShort { duration: f64 },
    Implausible { hits: u32, misses: u32 },
}

pub struct ClipValidator {
    min_duration: f64,
    max_consecutive_misses: u32,
    policy: Box<dyn AcceptancePolicy>,
}

impl ClipValidator {
    pub fn new(
        min_duration: f64,
        max_consecutive_misses: u32,
        policy: Box<dyn AcceptancePolicy>,
    ) -> Result<Self, ValidatorError> {
        if !min_duration.is_finite() || min_duration < 0.0 {
            return Err(ValidatorError::InvalidMinDuration(min_duration));
        }
        Ok(Self {
            min_duration,
            max_consecutive_misses,
            policy,
        })
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    pub fn policy(&self) -> &dyn AcceptancePolicy {
        self.policy.as_ref()
    }

    pub fn validate(&self, candidate: Candidate) -> Verdict {
        let duration = candidate.duration();
        if duration <= self.min_duration {
            return Verdict::TooShort { duration };
        }

        let evidence = MatchEvidence {
            hits: candidate.hits,
            misses: candidate.misses,
            max_consecutive_misses: self.max_consecutive_misses,
        };
        if !self.policy.accepts(&evidence) {
            return Verdict::Implausible {
                hits: candidate.hits,
                misses: candidate.misses,
            };
        }

        Verdict::Accepted(Clip {
            source_id: candidate.source_id,
            start_source_time: candidate.start_source_time,
            start_query_time: candidate.start_query_time,
            duration,
            hits: candidate.hits,
            misses: candidate.misses,
        })
    }
}

impl fmt::Debug for ClipValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipValidator")
            .field("min_duration", &self.min_duration)
            .field("max_consecutive_misses", &self.max_consecutive_misses)
            .field("policy", &self.policy.describe())
            .finish()
    }
}
