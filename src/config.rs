//! Application settings.
//!
//! Settings live in `<config_dir>/pin-annotate/config.json`. Every field has a
//! default so a partial or missing file still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: LogLevel,

    /// Multiplicative zoom change per wheel tick.
    pub zoom_step: f32,
    pub min_scale: f32,
    pub max_scale: f32,

    /// Pick radius in image pixels.
    pub hit_radius: f32,
    pub pin_radius: f32,
    /// Pointer travel (screen pixels) below which a press/release is a click.
    pub click_slop: f32,

    pub live_label_size: f32,
    pub raster_label_size: f32,
    pub document_label_size: f32,

    /// Largest width or height embedded in an exported document.
    pub document_max_dimension: u32,
    /// Page margin in points.
    pub page_margin: f32,
    pub jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            zoom_step: 0.1,
            min_scale: 0.05,
            max_scale: 50.0,
            hit_radius: 10.0,
            pin_radius: 8.0,
            click_slop: 5.0,
            live_label_size: 14.0,
            raster_label_size: 24.0,
            document_label_size: 36.0,
            document_max_dimension: 14_000,
            page_margin: 20.0,
            jpeg_quality: 95,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(AppError::Config(format!(
                "scale range {}..{} must be positive and ordered",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            return Err(AppError::Config(format!(
                "zoom_step {} must be between 0 and 1",
                self.zoom_step
            )));
        }
        if self.document_max_dimension == 0 {
            return Err(AppError::Config("document_max_dimension must be non-zero".into()));
        }
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pin-annotate").join("config.json"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Loads the config from the default location, falling back to defaults.
    /// Call after the logger is installed so load warnings are not lost.
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Level to apply once the config is read. `None` when `RUST_LOG` is set,
    /// since the environment filter already decided.
    pub fn max_log_level(&self, rust_log_set: bool) -> Option<log::LevelFilter> {
        (!rust_log_set).then(|| self.log_level.to_level_filter())
    }
}
