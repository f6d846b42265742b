use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that supplies the weather API key when the config file has none.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the weather provider; `/weather` is appended per request
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Provider API key (falls back to `OPENWEATHER_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP client timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WeatherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where the current position comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationProviderKind {
    /// Coordinates set in this file
    Fixed,
    /// Approximate position from an IP geolocation lookup
    #[default]
    Ip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub provider: LocationProviderKind,

    /// Latitude for the fixed provider
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Longitude for the fixed provider
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Endpoint used by the IP provider
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: LocationProviderKind::default(),
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// JSON file holding today's health samples
    #[serde(default = "default_samples_path")]
    pub samples_path: PathBuf,
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("glance")
}

fn default_samples_path() -> PathBuf {
    default_config_dir().join("health_samples.json")
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            samples_path: default_samples_path(),
        }
    }
}

/// Refresh cadence preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Foreground display, refreshed every minute
    #[default]
    Interactive,
    /// Passive widget, refreshed every five minutes
    Widget,
}

impl RefreshMode {
    pub fn default_interval(self) -> Duration {
        match self {
            RefreshMode::Interactive => Duration::from_secs(60),
            RefreshMode::Widget => Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default)]
    pub mode: RefreshMode,

    /// Overrides the mode's interval when set
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Upper bound for each aggregation branch before its fallback is used
    #[serde(default = "default_branch_timeout_secs")]
    pub branch_timeout_secs: u64,
}

fn default_branch_timeout_secs() -> u64 {
    10
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            mode: RefreshMode::default(),
            interval_secs: None,
            branch_timeout_secs: default_branch_timeout_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        self.interval_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.mode.default_interval())
    }

    pub fn branch_timeout(&self) -> Duration {
        Duration::from_secs(self.branch_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Thousands separator for step and calorie counts
    #[serde(default = "default_grouping_separator")]
    pub grouping_separator: String,
}

fn default_grouping_separator() -> String {
    " ".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            grouping_separator: default_grouping_separator(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            health: HealthConfig::default(),
            refresh: RefreshConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides_with(|k| std::env::var(k).ok());
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there first if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Fill settings that may come from the environment.
    ///
    /// Takes the lookup function as a parameter so tests don't touch the
    /// process environment.
    pub fn apply_env_overrides_with<F>(&mut self, mut get: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let has_key = self
            .weather
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            if let Some(key) = get(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
                tracing::info!("Using weather API key from {}", API_KEY_ENV);
                self.weather.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured (set it here or in {API_KEY_ENV}); weather will show the sample reading"),
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        match self.location.provider {
            LocationProviderKind::Fixed => match (self.location.latitude, self.location.longitude) {
                (Some(lat), Some(lon)) => {
                    if !(-90.0..=90.0).contains(&lat) {
                        result.add_error("location.latitude", "Latitude must be within -90..=90");
                    }
                    if !(-180.0..=180.0).contains(&lon) {
                        result.add_error(
                            "location.longitude",
                            "Longitude must be within -180..=180",
                        );
                    }
                }
                _ => result.add_error(
                    "location",
                    "Fixed location provider requires latitude and longitude",
                ),
            },
            LocationProviderKind::Ip => {
                self.validate_url(
                    &self.location.ip_lookup_url,
                    "location.ip_lookup_url",
                    &mut result,
                );
            }
        }

        if !self.health.samples_path.exists() {
            result.add_warning(
                "health.samples_path",
                format!(
                    "Path does not exist: {}; activity will show as unavailable",
                    self.health.samples_path.display()
                ),
            );
        }

        match self.refresh.interval_secs {
            Some(0) => result.add_error("refresh.interval_secs", "Refresh interval must be greater than 0"),
            Some(secs) if secs > 24 * 60 * 60 => result.add_warning(
                "refresh.interval_secs",
                "Refresh interval is more than 24 hours",
            ),
            _ => {}
        }

        if self.refresh.branch_timeout_secs == 0 {
            result.add_error(
                "refresh.branch_timeout_secs",
                "Branch timeout must be greater than 0",
            );
        }

        if self.display.grouping_separator.chars().count() > 1 {
            result.add_warning(
                "display.grouping_separator",
                "Separator longer than one character may not fit the display",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("glance");

        Ok(config_dir.join("config.toml"))
    }
}
