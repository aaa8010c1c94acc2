use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Coordinate;

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Process-wide settings, loaded once at startup and shared read-only.
///
/// Example TOML:
/// ```toml
/// openweather_api_key = "..."
/// request_timeout_secs = 10
/// bind_addr = "0.0.0.0:5000"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    pub open_meteo_base_url: String,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
    pub default_lat: f64,
    pub default_lon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            openweather_base_url: "https://api.openweathermap.org".to_string(),
            open_meteo_base_url: "https://air-quality-api.open-meteo.com".to_string(),
            request_timeout_secs: 10,
            bind_addr: "127.0.0.1:5000".to_string(),
            default_lat: 42.3149,
            default_lon: -83.0364,
        }
    }
}

impl Config {
    /// Load config from `path`, or from the platform config file when no path
    /// is given. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Overlay values taken from the process environment.
    pub fn apply_env(self) -> Self {
        self.with_api_key_from(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_from(mut self, value: Option<String>) -> Self {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.openweather_api_key = Some(key);
        }
        self
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "clean-sky", "airquality")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the OpenWeather key, if one is set and non-blank.
    pub fn openweather_api_key(&self) -> Option<&str> {
        self.openweather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn default_coordinate(&self) -> Coordinate {
        Coordinate::new(self.default_lat, self.default_lon)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
