use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Units;

pub const DEFAULT_FORECAST_URL: &str = "https://api.tomorrow.io/v4/weather/forecast";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_LOCATE_URL: &str = "https://ipinfo.io/json";
pub const DEFAULT_USER_AGENT: &str = "climasense-weather-app";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "CLIMASENSE_API_KEY";

/// Everything the HTTP clients need, resolved and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_key: String,
    pub forecast_url: String,
    pub geocode_url: String,
    /// IP geolocation endpoint used to guess a default city.
    pub locate_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub units: Units,
    /// Forecast memoization window; 0 disables it.
    pub cache_ttl_secs: u64,
}

impl ApiConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            locate_url: DEFAULT_LOCATE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            units: Units::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "imperial"
/// timeout_ms = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub units: Units,
    pub forecast_url: String,
    pub geocode_url: String,
    pub locate_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::default(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            locate_url: DEFAULT_LOCATE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "climasense", "climasense")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Resolve client settings, letting `CLIMASENSE_API_KEY` win over the stored key.
    pub fn api_config(&self) -> Result<ApiConfig> {
        self.api_config_with_override(std::env::var(API_KEY_ENV).ok())
    }

    pub fn api_config_with_override(&self, key_override: Option<String>) -> Result<ApiConfig> {
        let api_key = key_override
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `climasense configure` or set {API_KEY_ENV}."
                )
            })?;

        if self.timeout_ms == 0 {
            return Err(anyhow!("timeout_ms must be greater than zero"));
        }

        Ok(ApiConfig {
            api_key,
            forecast_url: self.forecast_url.clone(),
            geocode_url: self.geocode_url.clone(),
            locate_url: self.locate_url.clone(),
            user_agent: self.user_agent.clone(),
            timeout_ms: self.timeout_ms,
            units: self.units,
            cache_ttl_secs: self.cache_ttl_secs,
        })
    }
}
