//! Toolkit configuration.
//!
//! Handles loading, validating, and merging `imgkit.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top of it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [editor]
//! selection_color = "#0ea5e9"  # Outline of the selected layer
//! max_logo_fraction = 0.4      # New layers: at most this share of canvas width
//! min_layer_size = 20.0        # Size control minimum, in pixels
//! max_layer_fraction = 0.8     # Size control maximum, share of canvas width
//!
//! [resize]
//! percent = 100                # Longer edge, percent of the original (10-100)
//! quality = 80                 # JPEG quality (1-100)
//! max_size_mb = 2.0            # Output size ceiling
//!
//! [pdf]
//! percent = 70                 # Page content scale (10-100)
//!
//! [background]
//! command = "rembg"            # External segmentation program (unset = disabled)
//! args = ["i", "-", "-"]       # Arguments; image on stdin, PNG on stdout
//!
//! [processing]
//! max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early. Out-of-range values in
//! the file fail validation; percent overrides from the command line are
//! clamped with [`clamp_percent`] instead.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "imgkit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub editor: EditorConfig,
    pub resize: ResizeConfig,
    pub pdf: PdfConfig,
    pub background: BackgroundConfig,
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_hex_color(&self.editor.selection_color)?;
        if !(self.editor.max_logo_fraction > 0.0 && self.editor.max_logo_fraction <= 1.0) {
            return Err(ConfigError::Validation(
                "editor.max_logo_fraction must be in (0, 1]".into(),
            ));
        }
        if !(self.editor.max_layer_fraction > 0.0 && self.editor.max_layer_fraction <= 1.0) {
            return Err(ConfigError::Validation(
                "editor.max_layer_fraction must be in (0, 1]".into(),
            ));
        }
        if self.editor.min_layer_size <= 0.0 {
            return Err(ConfigError::Validation(
                "editor.min_layer_size must be positive".into(),
            ));
        }
        if !(10..=100).contains(&self.resize.percent) {
            return Err(ConfigError::Validation(
                "resize.percent must be 10-100".into(),
            ));
        }
        if !(1..=100).contains(&self.resize.quality) {
            return Err(ConfigError::Validation(
                "resize.quality must be 1-100".into(),
            ));
        }
        if self.resize.max_size_mb <= 0.0 {
            return Err(ConfigError::Validation(
                "resize.max_size_mb must be positive".into(),
            ));
        }
        if !(10..=100).contains(&self.pdf.percent) {
            return Err(ConfigError::Validation("pdf.percent must be 10-100".into()));
        }
        if self
            .background
            .command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "background.command must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Layer editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// `#rrggbb` or `#rrggbbaa`.
    pub selection_color: String,
    pub max_logo_fraction: f64,
    pub min_layer_size: f64,
    pub max_layer_fraction: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            selection_color: "#0ea5e9".to_string(),
            max_logo_fraction: 0.4,
            min_layer_size: 20.0,
            max_layer_fraction: 0.8,
        }
    }
}

/// Resize/compress settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub percent: u32,
    pub quality: u32,
    pub max_size_mb: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            percent: 100,
            quality: 80,
            max_size_mb: 2.0,
        }
    }
}

impl ResizeConfig {
    pub fn max_bytes(&self) -> u64 {
        (self.max_size_mb * 1024.0 * 1024.0) as u64
    }
}

/// PDF scaling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfConfig {
    pub percent: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { percent: 70 }
    }
}

/// External background-removal program. Disabled when `command` is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub args: Vec<String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
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
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Clamp a resize or PDF percentage to 10–100.
pub fn clamp_percent(percent: u32) -> u32 {
    percent.clamp(10, 100)
}

/// Parse `#rrggbb` / `#rrggbbaa` into a pixel.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, ConfigError> {
    let invalid = || ConfigError::Validation(format!("invalid color '{value}', expected #rrggbb"));
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 0xff };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `imgkit.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgkit configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Layer editor (compose)
# ---------------------------------------------------------------------------
[editor]
# Outline color of the selected layer (#rrggbb or #rrggbbaa).
selection_color = "#0ea5e9"
# A newly added layer is at most this share of the canvas width.
max_logo_fraction = 0.4
# Smallest width the size control accepts, in pixels.
min_layer_size = 20.0
# Largest width the size control accepts, as a share of the canvas width.
max_layer_fraction = 0.8

# ---------------------------------------------------------------------------
# Resize / compress
# ---------------------------------------------------------------------------
[resize]
# Target longer edge as a percentage of the original (10-100).
percent = 100
# JPEG quality (1-100). Lowered automatically to stay under max_size_mb.
quality = 80
# Output size ceiling in megabytes.
max_size_mb = 2.0

# ---------------------------------------------------------------------------
# PDF page scaling
# ---------------------------------------------------------------------------
[pdf]
# Page content scale as a percentage (10-100).
percent = 70

# ---------------------------------------------------------------------------
# Background removal
# ---------------------------------------------------------------------------
[background]
# External program that reads an image on stdin and writes a PNG with a
# transparent background to stdout. Leave unset to disable remove-bg.
# command = "rembg"
args = []

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for batch resize. Omit for auto (= CPU cores).
# max_processes = 4
"##
}
