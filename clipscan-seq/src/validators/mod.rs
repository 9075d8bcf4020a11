//! Validation layer
//!
//! Decides which closed candidates become clips.

pub mod clip_validator;

pub use clip_validator::{
    AcceptancePolicy, ClipValidator, MatchEvidence, MissAllowance, RatioPolicy, ValidatorError,
    ValidatorPreset, Verdict,
};
