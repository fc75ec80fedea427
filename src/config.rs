//! Tool configuration module.
//!
//! Handles loading, validating, and merging `darkroom.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything else keeps
//! its default.
//!
//! ## Config File Location
//!
//! By default `darkroom.toml` is read from the working directory and is
//! optional. `--config <file>` points at another file, which then must exist.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preset]
//! path = "preset.txt"          # Preset file read at start, written by `s`
//!
//! [export]
//! directory = "."              # Where edited images are written
//! pattern = "edited_{n}.jpg"   # `{n}` is the 0-based export counter
//! single = "output.jpg"        # File name used by `darkroom edit <image>`
//! quality = 95                 # JPEG quality (1-100)
//!
//! [denoise]
//! radius = 1                   # Median window radius (1 = 3x3)
//!
//! [inpaint]
//! radius = 3                   # Neighbourhood used to fill removed areas
//!
//! [overlay]
//! font = ""                    # TTF/OTF path; empty = search system fonts
//! scale = 32.0                 # Glyph height in pixels
//! color = [255, 255, 255]      # RGB
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DenoiseParams, InpaintParams, Quality, RustBackend, TextStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "darkroom.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Configuration loaded from `darkroom.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub preset: PresetConfig,
    pub export: ExportConfig,
    pub denoise: DenoiseConfig,
    pub inpaint: InpaintConfig,
    pub overlay: OverlayConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.export.quality) {
            return Err(ConfigError::Validation(
                "export.quality must be 1-100".into(),
            ));
        }
        if !self.export.pattern.contains("{n}") {
            return Err(ConfigError::Validation(
                "export.pattern must contain {n}".into(),
            ));
        }
        if self.export.single.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.single must not be empty".into(),
            ));
        }
        if self.preset.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "preset.path must not be empty".into(),
            ));
        }
        if self.inpaint.radius == 0 {
            return Err(ConfigError::Validation(
                "inpaint.radius must be at least 1".into(),
            ));
        }
        if !(self.overlay.scale.is_finite() && self.overlay.scale > 0.0) {
            return Err(ConfigError::Validation(
                "overlay.scale must be a positive number".into(),
            ));
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.export.quality)
    }

    pub fn denoise_params(&self) -> DenoiseParams {
        DenoiseParams {
            radius: self.denoise.radius,
        }
    }

    pub fn inpaint_params(&self) -> InpaintParams {
        InpaintParams {
            radius: self.inpaint.radius,
        }
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            scale: self.overlay.scale,
            color: self.overlay.color,
            ..TextStyle::default()
        }
    }

    /// Backend configured with the overlay font, if one is set.
    pub fn backend(&self) -> RustBackend {
        let font = self.overlay.font.trim();
        if font.is_empty() {
            RustBackend::new()
        } else {
            RustBackend::with_font(font)
        }
    }
}

/// Preset file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresetConfig {
    pub path: PathBuf,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("preset.txt"),
        }
    }
}

/// Export naming and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Output directory, created if missing.
    pub directory: PathBuf,
    /// Batch file name; `{n}` is replaced by the export counter.
    pub pattern: String,
    /// File name for the single-image `edit` command.
    pub single: String,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            pattern: "edited_{n}.jpg".to_string(),
            single: "output.jpg".to_string(),
            quality: 95,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DenoiseConfig {
    pub radius: u32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            radius: DenoiseParams::default().radius,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InpaintConfig {
    pub radius: u32,
}

impl Default for InpaintConfig {
    fn default() -> Self {
        Self {
            radius: InpaintParams::default().radius,
        }
    }
}

/// Text overlay appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// Font file; empty means search the usual system locations.
    pub font: String,
    pub scale: f32,
    pub color: [u8; 3],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        let style = TextStyle::default();
        Self {
            font: String::new(),
            scale: style.scale,
            color: style.color,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
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
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// With `explicit = Some(path)` the file must exist. Without it,
/// [`DEFAULT_CONFIG_FILE`] is read from `dir` when present and stock
/// defaults are used otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            Some(load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?)
        }
        None => load_raw_config(&dir.join(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `darkroom.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# darkroom configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
[preset]
# Four integers (brightness hue saturation light) read at start and
# written by the `s` command.
path = "preset.txt"

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Directory for exported images. Created if missing.
directory = "."

# Batch output name. {n} is replaced by 0, 1, 2, ... in catalogue order.
# Re-running overwrites earlier exports with the same numbers.
pattern = "edited_{n}.jpg"

# Output name for `darkroom edit <image>`.
single = "output.jpg"

# JPEG quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Denoise
# ---------------------------------------------------------------------------
[denoise]
# Median filter radius. 1 = 3x3 window, 2 = 5x5, ...
radius = 1

# ---------------------------------------------------------------------------
# Removal (inpainting)
# ---------------------------------------------------------------------------
[inpaint]
# Neighbourhood radius used to fill a removed rectangle.
radius = 3

# ---------------------------------------------------------------------------
# Text overlay
# ---------------------------------------------------------------------------
[overlay]
# TrueType/OpenType font file. Empty = search common system font paths.
font = ""

# Glyph height in pixels.
scale = 32.0

# Text colour as [red, green, blue].
color = [255, 255, 255]
"##
}
