//! TOML-based configuration for joinery.
//!
//! Example configuration:
//! ```toml
//! [fanout]
//! max_concurrency = 4
//! fetch_timeout_ms = 5000
//! deadline_ms = 12000  # optional; no overall deadline when absent
//!
//! [paging]
//! default_top = 50
//! max_top = 100
//! summary_top = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::enrich::FanOutConfig;
use crate::query::Pagination;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Fan-out fetch configuration.
    pub fanout: FanOutSettings,

    /// Page size configuration.
    pub paging: PagingSettings,
}

/// Fan-out fetch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FanOutSettings {
    /// Maximum fetches in flight per fan-out.
    pub max_concurrency: usize,

    /// Per-fetch timeout in milliseconds. Also bounds the primary fetch.
    pub fetch_timeout_ms: u64,

    /// Overall enrichment deadline in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fetch_timeout_ms: 5000,
            deadline_ms: None,
        }
    }
}

impl FanOutSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn to_config(&self) -> FanOutConfig {
        FanOutConfig {
            max_concurrency: self.max_concurrency,
            fetch_timeout: self.fetch_timeout(),
        }
    }
}

/// Page size configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PagingSettings {
    /// Page size when the caller gives none.
    pub default_top: u32,

    /// Largest page a caller may request.
    pub max_top: u32,

    /// Row cap for summary fetches, which are not paged.
    pub summary_top: u32,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            default_top: 50,
            max_top: 100,
            summary_top: 1000,
        }
    }
}

impl PagingSettings {
    /// Resolve a requested page against the configured limits.
    ///
    /// A missing page uses `default_top`; a requested size is kept within
    /// `1..=max_top`.
    pub fn clamp(&self, requested: Option<Pagination>) -> Pagination {
        match requested {
            Some(page) => Pagination::new(page.top.clamp(1, self.max_top), page.skip),
            None => Pagination::new(self.default_top.min(self.max_top), 0),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `JOINERY_CONFIG`
    /// 2. `./joinery.toml`
    /// 3. `~/.config/joinery/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("JOINERY_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("joinery.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("joinery").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.fanout.max_concurrency == 0 {
            return Err(SettingsError::InvalidConfig(
                "fanout.max_concurrency must be at least 1".into(),
            ));
        }
        if self.fanout.fetch_timeout_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "fanout.fetch_timeout_ms must be positive".into(),
            ));
        }
        if self.fanout.deadline_ms == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "fanout.deadline_ms must be positive when set".into(),
            ));
        }
        if self.paging.max_top == 0 || self.paging.default_top == 0 {
            return Err(SettingsError::InvalidConfig(
                "paging sizes must be positive".into(),
            ));
        }
        if self.paging.default_top > self.paging.max_top {
            return Err(SettingsError::InvalidConfig(format!(
                "paging.default_top ({}) exceeds paging.max_top ({})",
                self.paging.default_top, self.paging.max_top
            )));
        }
        if self.paging.summary_top == 0 {
            return Err(SettingsError::InvalidConfig(
                "paging.summary_top must be positive".into(),
            ));
        }
        Ok(())
    }
}
