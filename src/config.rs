//! Run settings loaded from TOML.
//!
//! Every field has a default, so an empty or missing file is valid. CLI flags
//! override individual values after loading.
//!
//! ```toml
//! [fetch]
//! workers = 8
//! min_bytes = 2000
//!
//! [filters]
//! color_mode = "keep-color-in-place"
//! text_score = 0.5
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classify::{ColorMode, Thresholds};
use crate::download::constants::{
    DEFAULT_MAX_WORKERS, DEFAULT_MIN_BYTES, FETCH_TIMEOUT_SECS, MAX_WORKERS, MIN_WORKERS,
};

const APP_DIR: &str = "mediarip";
const CONFIG_FILE: &str = "config.toml";

/// Errors from loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Settings`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Settings could not be rendered back to TOML.
    #[error("failed to render settings: {0}")]
    Render(#[from] toml::ser::Error),

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Accepted range.
        expected: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::Invalid {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Scraper pacing. Carried for front-ends that drive a browser; the fetch
/// and filter stages never read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Pause after each scroll, seconds.
    pub scroll_pause_secs: f64,
    /// Upper bound on scroll iterations.
    pub max_scrolls: u32,
    /// Delay between opening pins, seconds.
    pub pin_delay_secs: f64,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            scroll_pause_secs: 0.8,
            max_scrolls: 50,
            pin_delay_secs: 1.2,
        }
    }
}

/// Acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Concurrent fetch workers (1..=64).
    pub workers: usize,
    /// Bodies shorter than this are discarded.
    pub min_bytes: usize,
    /// Whole-request timeout, seconds.
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_MAX_WORKERS,
            min_bytes: DEFAULT_MIN_BYTES,
            timeout_secs: FETCH_TIMEOUT_SECS,
        }
    }
}

impl FetchSettings {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Classification thresholds and routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Images narrower or shorter than this many pixels are deleted.
    pub min_pixels: u32,
    /// Byte floor used when dimensions cannot be decoded.
    pub fallback_bytes: u64,
    /// Saturation below which a pixel counts as unsaturated.
    pub sat_low: f64,
    /// Share of unsaturated pixels needed for greyscale.
    pub sat_px_fraction: f64,
    /// Highest 90th-percentile saturation still greyscale.
    pub sat_p90_max: f64,
    /// Highest colorfulness still greyscale.
    pub colorfulness: f64,
    /// Highest mean Lab chroma still greyscale.
    pub mean_chroma: f64,
    /// Text-likeness score at which an image is deleted.
    pub text_score: f64,
    /// OCR alphanumeric count at which an image is deleted.
    pub ocr_letters_min: usize,
    /// `both`, `keep-color-in-place` or `keep-grey-in-place`; anything else
    /// behaves like `both`.
    pub color_mode: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let t = Thresholds::default();
        Self {
            min_pixels: t.min_pixels,
            fallback_bytes: t.fallback_bytes,
            sat_low: t.sat_low,
            sat_px_fraction: t.sat_px_fraction,
            sat_p90_max: t.sat_p90_max,
            colorfulness: t.colorfulness,
            mean_chroma: t.mean_chroma,
            text_score: t.text_score,
            ocr_letters_min: t.ocr_letters_min,
            color_mode: ColorMode::default().to_string(),
        }
    }
}

impl FilterSettings {
    /// Scorer thresholds.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_pixels: self.min_pixels,
            fallback_bytes: self.fallback_bytes,
            sat_low: self.sat_low,
            sat_px_fraction: self.sat_px_fraction,
            sat_p90_max: self.sat_p90_max,
            colorfulness: self.colorfulness,
            mean_chroma: self.mean_chroma,
            text_score: self.text_score,
            ocr_letters_min: self.ocr_letters_min,
        }
    }

    /// Parsed routing mode.
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        ColorMode::parse_lenient(&self.color_mode)
    }
}

/// All settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[scrape]`: pacing handed to the scraping collaborator.
    pub scrape: ScrapeSettings,
    /// `[fetch]`: worker pool and HTTP limits.
    pub fetch: FetchSettings,
    /// `[filters]`: classification thresholds and color routing.
    pub filters: FilterSettings,
}

impl Settings {
    /// Parses settings from TOML text and validates them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable, malformed or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Loads `explicit` if given, else the default path when it exists,
    /// else defaults. Returns the file actually read, if any.
    ///
    /// # Errors
    ///
    /// An explicit path must exist; any file that is read must be valid.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        match resolve_default_config_path() {
            Some(path) if path.is_file() => {
                let settings = Self::load(&path)?;
                Ok((settings, Some(path)))
            }
            other => {
                debug!(path = ?other, "no config file, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fetch = &self.fetch;
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&fetch.workers) {
            return Err(ConfigError::invalid("fetch.workers", fetch.workers, "1..=64"));
        }
        if !(1..=3600).contains(&fetch.timeout_secs) {
            return Err(ConfigError::invalid(
                "fetch.timeout_secs",
                fetch.timeout_secs,
                "1..=3600",
            ));
        }

        let scrape = &self.scrape;
        if !is_non_negative(scrape.scroll_pause_secs) {
            return Err(ConfigError::invalid(
                "scrape.scroll_pause_secs",
                scrape.scroll_pause_secs,
                "a non-negative number",
            ));
        }
        if !is_non_negative(scrape.pin_delay_secs) {
            return Err(ConfigError::invalid(
                "scrape.pin_delay_secs",
                scrape.pin_delay_secs,
                "a non-negative number",
            ));
        }

        let filters = &self.filters;
        for (field, value) in [
            ("filters.sat_low", filters.sat_low),
            ("filters.sat_px_fraction", filters.sat_px_fraction),
            ("filters.sat_p90_max", filters.sat_p90_max),
            ("filters.text_score", filters.text_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, value, "0.0..=1.0"));
            }
        }
        for (field, value) in [
            ("filters.colorfulness", filters.colorfulness),
            ("filters.mean_chroma", filters.mean_chroma),
        ] {
            if !is_non_negative(value) {
                return Err(ConfigError::invalid(field, value, "a non-negative number"));
            }
        }
        if filters.min_pixels == 0 {
            return Err(ConfigError::invalid("filters.min_pixels", 0, "at least 1"));
        }
        Ok(())
    }

    /// Renders the settings as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/mediarip/config.toml`
/// 2. `$HOME/.config/mediarip/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE),
    )
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}
