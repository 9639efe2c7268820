use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    chat::completions,
    error::Error,
    model::{DEFAULT_FORECAST_DAYS, DEFAULT_LOCATION, ForecastRequest},
    provider::weatherapi,
};

pub const WEATHER_API_KEY_ENV: &str = "WEATHER_API";
pub const MODEL_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const LOCATION_ENV: &str = "LAUNDRY_LOCATION";
pub const MODEL_ENV: &str = "LAUNDRY_MODEL";

pub use crate::model::MAX_FORECAST_DAYS;

/// Settings as read from disk and the environment. Everything is optional here;
/// [`Config::validate`] decides what is actually required.
///
/// Example TOML:
/// ```toml
/// weather_api_key = "..."
/// model_api_key = "..."
/// location = "Tuguegarao"
/// forecast_days = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub weather_api_key: Option<String>,
    pub model_api_key: Option<String>,
    pub location: Option<String>,
    pub forecast_days: Option<u8>,
    pub model: Option<String>,
    pub weather_base_url: Option<String>,
    pub model_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Validated settings the assistant is built from. Read-only once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub weather_api_key: String,
    pub model_api_key: String,
    pub location: String,
    pub forecast_days: u8,
    pub model: String,
    pub weather_base_url: String,
    pub model_base_url: String,
    pub timeout: Option<Duration>,
}

// Keys stay out of logs and error output.
impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("weather_api_key", &"***")
            .field("model_api_key", &"***")
            .field("location", &self.location)
            .field("forecast_days", &self.forecast_days)
            .field("model", &self.model)
            .field("weather_base_url", &self.weather_base_url)
            .field("model_base_url", &self.model_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AssistantConfig {
    pub fn forecast_request(&self) -> ForecastRequest {
        ForecastRequest { location: self.location.clone(), days: self.forecast_days }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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
        let dirs = ProjectDirs::from("dev", "laundry-day", "laundry-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay process environment variables on top of the file settings.
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::with_env`], with an injectable variable lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(WEATHER_API_KEY_ENV) {
            self.weather_api_key = Some(key);
        }
        if let Some(key) = non_empty(MODEL_API_KEY_ENV) {
            self.model_api_key = Some(key);
        }
        if let Some(location) = non_empty(LOCATION_ENV) {
            self.location = Some(location);
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.model = Some(model);
        }
        self
    }

    /// Check required credentials and fill defaults.
    pub fn validate(&self) -> Result<AssistantConfig, Error> {
        let weather_api_key = required(&self.weather_api_key, WEATHER_API_KEY_ENV)?;
        let model_api_key = required(&self.model_api_key, MODEL_API_KEY_ENV)?;

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION)
            .to_string();
        let forecast_days = self.forecast_days.unwrap_or(DEFAULT_FORECAST_DAYS);

        ForecastRequest { location: location.clone(), days: forecast_days }.validate()?;

        Ok(AssistantConfig {
            weather_api_key,
            model_api_key,
            location,
            forecast_days,
            model: self.model.clone().unwrap_or_else(|| completions::DEFAULT_MODEL.to_string()),
            weather_base_url: self
                .weather_base_url
                .clone()
                .unwrap_or_else(|| weatherapi::DEFAULT_BASE_URL.to_string()),
            model_base_url: self
                .model_base_url
                .clone()
                .unwrap_or_else(|| completions::DEFAULT_BASE_URL.to_string()),
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

fn required(value: &Option<String>, env_name: &str) -> Result<String, Error> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string).ok_or_else(
        || {
            Error::Configuration(format!(
                "{env_name} is not set. Export it or add it to the config file."
            ))
        },
    )
}
