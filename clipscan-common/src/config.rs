//! Configuration file schema and discovery
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tier 3: locating and decoding the TOML file. Tiers 1, 2
//! and 4 are applied by the consuming binary.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CLIPSCAN_CONFIG";

/// Directory name under the platform config dir
const APP_DIR: &str = "clipscan";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level TOML config
///
/// Every field is optional so that a partial file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub detection: DetectionSection,
    pub output: OutputSection,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "clipscan_seq=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[detection]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSection {
    /// Frame-index matching slack
    pub tolerance: Option<u64>,
    /// Consecutive misses that close a candidate
    pub max_consecutive_misses: Option<u32>,
    /// Minimum accepted clip duration (seconds, exclusive)
    pub min_duration: Option<f64>,
    /// Validator preset name
    pub preset: Option<String>,
    /// Overrides the preset's accuracy factor
    pub accuracy_factor: Option<f64>,
    /// Overrides the preset's miss allowance: a number or "max-consecutive"
    pub miss_allowance: Option<String>,
}

/// `[output]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Directory receiving `<video_id>.<ext>` result files
    pub dir: Option<PathBuf>,
    /// "text" or "json"
    pub format: Option<String>,
}

/// Platform default config location (`~/.config/clipscan/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Locate the config file to load, if any
///
/// An explicitly named file (argument or environment) must exist. The
/// platform default is only used when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return require_existing(path.to_path_buf(), "command line");
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return require_existing(PathBuf::from(path), CONFIG_ENV_VAR);
        }
    }

    // Priority 3: Platform default, only if it exists
    Ok(default_config_path().filter(|p| p.exists()))
}

fn require_existing(path: PathBuf, origin: &str) -> Result<Option<PathBuf>> {
    if path.is_file() {
        Ok(Some(path))
    } else {
        Err(Error::Config(format!(
            "Config file from {} not found: {}",
            origin,
            path.display()
        )))
    }
}

/// Read and decode a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| Error::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve and load the config, falling back to defaults when no file exists
///
/// Returns the config together with the path it was read from.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    match resolve_config_path(cli_arg)? {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            let config = load_toml_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            info!("No config file found, using compiled defaults");
            Ok((TomlConfig::default(), None))
        }
    }
}
