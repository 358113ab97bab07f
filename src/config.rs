//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User files are
//! sparse: stock defaults are the base layer and the file overrides only the
//! keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [timing]
//! stagger_interval_ms = 300  # Delay added per card that became visible before this one
//! retry_delay_ms = 4000      # Pause before re-attempting a failed embed
//! max_retries = 2            # Total load attempts before the fallback card
//! fade_ms = 400              # Placeholder fade-out duration
//!
//! [observer]
//! root_margin_px = 150       # Lookahead beyond the viewport edge
//! threshold = 0.0            # Visible fraction that counts as "in view"
//!
//! [catalog]
//! location = "posts.json"    # Sidecar catalog, relative to the site root
//! cache_bust = true          # Append a fresh ?v= to every fetch
//!
//! [placeholder]
//! style = "image"            # "image" or "polaroid" (image + caption)
//!
//! [fallback]
//! byline = "Posted on LinkedIn"
//! cta = "Couldn't load this post here. Use Open to read it on LinkedIn."
//! open_label = "Open"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Spacing between load triggers of cards that became visible together.
pub const STAGGER_INTERVAL: Duration = Duration::from_millis(300);
/// Pause between a failed attempt and the next one.
pub const RETRY_DELAY: Duration = Duration::from_millis(4000);
/// Total load attempts per card, including the first.
pub const MAX_RETRIES: u32 = 2;
/// Placeholder fade-out duration.
pub const FADE_DURATION: Duration = Duration::from_millis(400);
/// Lookahead beyond the viewport edge, in CSS pixels.
pub const ROOT_MARGIN_PX: f64 = 150.0;
/// Any intersecting pixel counts.
pub const VISIBILITY_THRESHOLD: f64 = 0.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Stagger, retry and fade timings.
    pub timing: TimingConfig,
    /// Viewport watcher settings.
    pub observer: ObserverConfig,
    /// Where the post catalog lives.
    pub catalog: CatalogConfig,
    /// Pre-load placeholder presentation.
    pub placeholder: PlaceholderConfig,
    /// Text of the fallback card shown after retries run out.
    pub fallback: FallbackConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.max_retries == 0 {
            return Err(ConfigError::Validation(
                "timing.max_retries must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.observer.threshold) {
            return Err(ConfigError::Validation(
                "observer.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.observer.root_margin_px < 0.0 || !self.observer.root_margin_px.is_finite() {
            return Err(ConfigError::Validation(
                "observer.root_margin_px must be a non-negative number".into(),
            ));
        }
        if self.catalog.location.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.location must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The load policy handed to every card's state machine.
    pub fn policy(&self) -> LoadPolicy {
        LoadPolicy::from(&self.timing)
    }
}

/// Timing settings, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub stagger_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub max_retries: u32,
    pub fade_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            stagger_interval_ms: STAGGER_INTERVAL.as_millis() as u64,
            retry_delay_ms: RETRY_DELAY.as_millis() as u64,
            max_retries: MAX_RETRIES,
            fade_ms: FADE_DURATION.as_millis() as u64,
        }
    }
}

/// Viewport watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObserverConfig {
    /// Pixels the watched region extends beyond the viewport edge.
    pub root_margin_px: f64,
    /// Fraction of the element that must be inside the region.
    /// `0.0` means edge contact is enough.
    pub threshold: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            root_margin_px: ROOT_MARGIN_PX,
            threshold: VISIBILITY_THRESHOLD,
        }
    }
}

/// Catalog location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub location: String,
    pub cache_bust: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            location: "posts.json".to_string(),
            cache_bust: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// Preview image only.
    #[default]
    Image,
    /// Preview image with the title as a caption underneath.
    Polaroid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    pub style: PlaceholderStyle,
}

/// Fallback card text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub byline: String,
    pub cta: String,
    pub open_label: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            byline: "Posted on LinkedIn".to_string(),
            cta: "Couldn't load this post here. Use Open to read it on LinkedIn.".to_string(),
            open_label: "Open".to_string(),
        }
    }
}

/// Retry and pacing policy as plain data.
///
/// Built from [`TimingConfig`] in production; tests construct it directly,
/// usually with [`LoadPolicy::immediate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub stagger_interval: Duration,
    pub fade_duration: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            stagger_interval: STAGGER_INTERVAL,
            fade_duration: FADE_DURATION,
        }
    }
}

impl LoadPolicy {
    /// Same attempt budget, zero delays.
    pub fn immediate() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            stagger_interval: Duration::ZERO,
            fade_duration: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before the trigger of the card with the given stagger index.
    pub fn stagger_delay(&self, index: u32) -> Duration {
        self.stagger_interval * index
    }
}

impl From<&TimingConfig> for LoadPolicy {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            max_attempts: timing.max_retries,
            retry_delay: Duration::from_millis(timing.retry_delay_ms),
            stagger_interval: Duration::from_millis(timing.stagger_interval_ms),
            fade_duration: Duration::from_millis(timing.fade_ms),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when the
/// file is absent.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Embed Gallery Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Timing
# ---------------------------------------------------------------------------
[timing]
# Each card that scrolls into view waits this long per card that became
# visible before it, so the provider never sees a burst of requests.
stagger_interval_ms = 300

# Pause before retrying an embed that failed or came back as an error page.
retry_delay_ms = 4000

# Total load attempts (including the first) before showing the fallback card.
max_retries = 2

# Placeholder fade-out duration once the embed has loaded.
fade_ms = 400

# ---------------------------------------------------------------------------
# Viewport watcher
# ---------------------------------------------------------------------------
[observer]
# How far beyond the viewport edge a card starts loading, in CSS pixels.
root_margin_px = 150.0

# Fraction of the card that must be inside the region (0.0 = any pixel).
threshold = 0.0

# ---------------------------------------------------------------------------
# Catalog
# ---------------------------------------------------------------------------
[catalog]
# JSON list of {title, image, url} records, relative to the site root.
location = "posts.json"

# Fetch with a fresh ?v= query so a stale copy is never served.
cache_bust = true

# ---------------------------------------------------------------------------
# Placeholder
# ---------------------------------------------------------------------------
[placeholder]
# "image" shows the preview image; "polaroid" adds the title as a caption.
style = "image"

# ---------------------------------------------------------------------------
# Fallback card
# ---------------------------------------------------------------------------
[fallback]
byline = "Posted on LinkedIn"
cta = "Couldn't load this post here. Use Open to read it on LinkedIn."
open_label = "Open"
"##
}
