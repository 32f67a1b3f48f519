//! Studio configuration module.
//!
//! Handles loading, validating, and merging `studio.toml`. Stock defaults are
//! overridden by whatever the user file specifies; the file is sparse and
//! may set a single key.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [album]
//! page_count = 20           # Pages per album (the product's page count)
//! default_layout = "single" # Layout of every page in a fresh album
//!
//! [cover]
//! template = "classic"      # Preset ids, stored verbatim in the document
//! font = "serif"
//! color = "black"
//! title_max_chars = 30      # Enforced by the input surface, not the document
//!
//! [upload]
//! # endpoint = "https://shop.example/api/upload"
//! field_name = "image"      # Multipart field carrying the file
//! directory = "uploads"     # Local store used when no endpoint is set
//! # auth_token = "..."      # Sent as a bearer token
//! # timeout_secs = 30       # Omit for no timeout
//!
//! [export]
//! artifact_prefix = "album-design"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::layout::Layout;
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

/// Studio configuration loaded from `studio.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    /// Album shape for new documents.
    pub album: AlbumConfig,
    /// Cover presets and the title cap.
    pub cover: CoverConfig,
    /// Where uploaded images and the exported artifact go.
    pub upload: UploadConfig,
    /// Export artifact naming.
    pub export: ExportConfig,
}

impl StudioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.album.page_count == 0 {
            return Err(ConfigError::Validation(
                "album.page_count must be at least 1".into(),
            ));
        }
        if self.cover.title_max_chars == 0 {
            return Err(ConfigError::Validation(
                "cover.title_max_chars must be at least 1".into(),
            ));
        }
        if self.upload.field_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upload.field_name must not be empty".into(),
            ));
        }
        if self.upload.endpoint.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "upload.endpoint must not be empty when set".into(),
            ));
        }
        if self.export.artifact_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.artifact_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Album shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlbumConfig {
    /// Number of pages in a fresh album. Fixed for the album's lifetime.
    pub page_count: usize,
    /// Layout every page starts with.
    #[serde(with = "strict_layout")]
    pub default_layout: Layout,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            page_count: 20,
            default_layout: Layout::Single,
        }
    }
}

/// Cover presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverConfig {
    pub template: String,
    pub font: String,
    pub color: String,
    /// Longest title the input surface accepts, in characters.
    pub title_max_chars: usize,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            template: "classic".to_string(),
            font: "serif".to_string(),
            color: "black".to_string(),
            title_max_chars: 30,
        }
    }
}

/// Upload target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// HTTP endpoint accepting a multipart file. When absent, uploads are
    /// stored in `directory`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Multipart field name carrying the file.
    pub field_name: String,
    /// Local directory for uploads when no endpoint is configured.
    pub directory: String,
    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Per-request timeout. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            field_name: "image".to_string(),
            directory: "uploads".to_string(),
            auth_token: None,
            timeout_secs: None,
        }
    }
}

/// Export artifact naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Artifact file name prefix; a millisecond timestamp follows it.
    pub artifact_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            artifact_prefix: "album-design".to_string(),
        }
    }
}

/// Config files are user input, so layout tags are parsed strictly here
/// rather than with the document's collage fallback.
mod strict_layout {
    use crate::layout::Layout;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(layout: &Layout, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(layout.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Layout, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(StudioConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
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

/// Load a config file as a raw TOML value. `Ok(None)` when it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<StudioConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: StudioConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `studio.toml` from `path`, falling back to stock defaults when the
/// file is absent.
pub fn load_config(path: &Path) -> Result<StudioConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `studio.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Album Studio Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Album shape
# ---------------------------------------------------------------------------
[album]
# Pages per album. Fixed once an album is created.
page_count = 20

# Layout every page starts with: single (1 photo), double (2), grid (4),
# collage (6).
default_layout = "single"

# ---------------------------------------------------------------------------
# Cover presets
# ---------------------------------------------------------------------------
[cover]
template = "classic"
font = "serif"
color = "black"

# Longest cover title accepted, in characters.
title_max_chars = 30

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[upload]
# Storefront image endpoint (multipart POST, answers {"url": "..."}).
# Leave commented out to store uploads in `directory` instead.
# endpoint = "https://shop.example/api/upload"

# Multipart field carrying the file.
field_name = "image"

# Local upload store used when no endpoint is configured.
directory = "uploads"

# Bearer token sent with each upload request.
# auth_token = ""

# Per-request timeout in seconds. Omit to wait indefinitely.
# timeout_secs = 30

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# The exported design is named <prefix>-<unix millis>.json
artifact_prefix = "album-design"
"##
}
