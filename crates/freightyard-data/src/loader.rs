//! Configuration and scenario loading.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers. Files are plain serde documents; missing fields
//! take their defaults.

use freightyard_core::config::EngineConfig;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::schema::ScenarioScript;

/// Base name searched for when no configuration path is given.
pub const DEFAULT_CONFIG_NAME: &str = "freightyard";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading configuration or scenario files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The given file does not exist.
    #[error("file not found: {file}")]
    Missing { file: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The file parsed but holds an unusable value.
    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_config_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, ConfigError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(ConfigError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = detect_format(path)?;
    if !path.exists() {
        return Err(ConfigError::Missing {
            file: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format).map_err(|detail| ConfigError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// Deserialize a document already in memory.
pub fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

// ===========================================================================
// Engine configuration
// ===========================================================================

/// Load an [`EngineConfig`] from a RON, TOML or JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = deserialize_file(path)?;
    validate_config(&config, path)?;
    tracing::info!(path = %path.display(), seed = config.seed, "configuration loaded");
    Ok(config)
}

/// Load from `path` if given; otherwise look for `freightyard.{ron,toml,json}`
/// in `search_dir`; otherwise use the defaults.
pub fn load_config_or_default(
    path: Option<&Path>,
    search_dir: &Path,
) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }
    match find_config_file(search_dir, DEFAULT_CONFIG_NAME)? {
        Some(found) => load_config(&found),
        None => {
            tracing::debug!("no configuration file; using defaults");
            Ok(EngineConfig::default())
        }
    }
}

fn validate_config(config: &EngineConfig, path: &Path) -> Result<(), ConfigError> {
    let invalid = |detail: &str| ConfigError::Invalid {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    };
    if config.max_cars_per_job == 0 {
        return Err(invalid("max_cars_per_job must be at least 1"));
    }
    if config.notifier.inbox_capacity == 0 {
        return Err(invalid("notifier.inbox_capacity must be at least 1"));
    }
    if config.notifier.outbox_capacity == 0 {
        return Err(invalid("notifier.outbox_capacity must be at least 1"));
    }
    Ok(())
}

// ===========================================================================
// Scenarios
// ===========================================================================

/// Load a scripted sequence of jobs to run through reserve, take and finish.
pub fn load_scenario(path: &Path) -> Result<ScenarioScript, ConfigError> {
    let script: ScenarioScript = deserialize_file(path)?;
    if script.steps.is_empty() {
        return Err(ConfigError::Invalid {
            file: path.to_path_buf(),
            detail: "scenario has no steps".to_string(),
        });
    }
    Ok(script)
}

// ===========================================================================
// Tests
// ===========================================================================
