//! # Clipscan Common Library
//!
//! Shared code for the clipscan tools including:
//! - Error and result types
//! - TOML configuration schema and discovery
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
