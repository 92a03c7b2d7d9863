//! Configuration loaded from `respimg.toml`.
//!
//! Stock defaults are the base layer; a user file overrides only the keys it
//! names. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! default_size = "thumbnail"      # size used when none is given
//!
//! [selection]
//! maintain_aspect_ratio = true    # only soft-cropped renditions
//! excluded_sizes = []             # size names never offered
//! included_sizes = []             # when non-empty, the only names offered
//!
//! [processing]
//! max_processes = 4               # parallel documents (omit for CPU cores)
//! ```
//!
//! `sizes` is a top-level key, so it must come before the first table. It is
//! either a raw string or an ordered list of rules:
//!
//! ```toml
//! sizes = "(max-width: 600px) 100vw, 600px"
//!
//! # or
//! [[sizes]]
//! value = "100vw"
//! media_condition = "max-width"
//! media_length = "480px"
//! ```
//!
//! Without `sizes`, every image gets `(max-width: <width>px) 100vw, <width>px`.

use crate::descriptor::SizesSpec;
use crate::select::SelectionFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything the srcset core and the command line can be told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsiveConfig {
    /// Size name used when the caller does not name one.
    pub default_size: String,
    /// `sizes` attribute for every image. `None` derives it from image width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<SizesSpec>,
    /// Which renditions may appear in a srcset.
    pub selection: SelectionFilter,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            default_size: "thumbnail".to_string(),
            sizes: None,
            selection: SelectionFilter::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ResponsiveConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_size.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_size must not be empty".into(),
            ));
        }
        if let Some(SizesSpec::Rules(rules)) = &self.sizes {
            if let Some(rule) = rules.iter().find(|r| r.value.contains(',')) {
                return Err(ConfigError::Validation(format!(
                    "sizes rule value must not contain ',': {:?}",
                    rule.value
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of documents rewritten at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ResponsiveConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a user
///   `excluded_sizes` list replaces the stock one rather than extending it.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResponsiveConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResponsiveConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, falling back to stock defaults if it is absent.
pub fn load_config(path: &Path) -> Result<ResponsiveConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `respimg.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# respimg Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Size name used when a command is not given one.
default_size = "thumbnail"

# The sizes attribute added next to every srcset. Omit it to use
#   (max-width: <image width>px) 100vw, <image width>px
# Either a raw string:
# sizes = "(max-width: 600px) 100vw, 600px"
# or an ordered list of rules (first matching media query wins):
# [[sizes]]
# value = "100vw"
# media_condition = "max-width"
# media_length = "480px"
#
# [[sizes]]
# value = "480px"

# ---------------------------------------------------------------------------
# Candidate selection
# ---------------------------------------------------------------------------
[selection]
# Only offer renditions with the same aspect ratio as the placed image
# (within 0.01). Hard-cropped sizes such as square thumbnails drop out.
maintain_aspect_ratio = true

# Size names never offered in a srcset.
excluded_sizes = []

# When non-empty, only these size names are offered. Applied after
# excluded_sizes.
included_sizes = []

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of documents rewritten in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
