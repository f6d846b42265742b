use glance_core::NetworkError;
use serde::{Deserialize, Serialize};

/// Display icon identifiers understood by the presentation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DisplayIcon {
    #[serde(rename = "sun.max")]
    SunMax,
    #[serde(rename = "cloud.sun")]
    CloudSun,
    #[serde(rename = "cloud")]
    Cloud,
    #[serde(rename = "cloud.heavyrain")]
    CloudHeavyRain,
    #[serde(rename = "cloud.sun.rain")]
    CloudSunRain,
    #[serde(rename = "cloud.bolt.rain")]
    CloudBoltRain,
    #[serde(rename = "cloud.snow")]
    CloudSnow,
    #[serde(rename = "cloud.fog")]
    CloudFog,
    #[default]
    #[serde(rename = "questionmark.circle")]
    Unknown,
}

impl DisplayIcon {
    /// Map an OpenWeatherMap icon code to a display icon.
    /// Day (`d`) and night (`n`) variants collapse to the same icon.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "01d" | "01n" => Self::SunMax,
            "02d" | "02n" => Self::CloudSun,
            "03d" | "03n" | "04d" | "04n" => Self::Cloud,
            "09d" | "09n" => Self::CloudHeavyRain,
            "10d" | "10n" => Self::CloudSunRain,
            "11d" | "11n" => Self::CloudBoltRain,
            "13d" | "13n" => Self::CloudSnow,
            "50d" | "50n" => Self::CloudFog,
            _ => Self::Unknown,
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::SunMax => "sun.max",
            Self::CloudSun => "cloud.sun",
            Self::Cloud => "cloud",
            Self::CloudHeavyRain => "cloud.heavyrain",
            Self::CloudSunRain => "cloud.sun.rain",
            Self::CloudBoltRain => "cloud.bolt.rain",
            Self::CloudSnow => "cloud.snow",
            Self::CloudFog => "cloud.fog",
            Self::Unknown => "questionmark.circle",
        }
    }

    /// Single glyph for text-only surfaces
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::SunMax => "☀",
            Self::CloudSun => "⛅",
            Self::Cloud => "☁",
            Self::CloudHeavyRain => "🌧",
            Self::CloudSunRain => "🌦",
            Self::CloudBoltRain => "⛈",
            Self::CloudSnow => "🌨",
            Self::CloudFog => "🌫",
            Self::Unknown => "?",
        }
    }
}

impl std::fmt::Display for DisplayIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Geographic location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Provider code recorded when the response carries no icon
pub const MISSING_PROVIDER_ICON: &str = "?";

/// Current conditions, normalized for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub display_icon: DisplayIcon,
    /// Raw provider icon code, kept for diagnostics
    pub provider_icon: String,
    pub temperature_celsius: f64,
}

impl Weather {
    /// Fixed reading shown when weather can't be fetched
    pub fn sample() -> Self {
        Self {
            display_icon: DisplayIcon::SunMax,
            provider_icon: "sun".to_string(),
            temperature_celsius: 100.0,
        }
    }

    pub fn is_sample(&self) -> bool {
        *self == Self::sample()
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("No location fix obtained")]
    NoFix,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Location access denied",
            LocationError::NoFix | LocationError::Timeout => "Location not found",
            LocationError::ServiceUnavailable | LocationError::Other(_) => {
                "Location unavailable"
            }
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Weather API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Weather client misconfigured: {0}")]
    Config(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(e) => e.user_message(),
            WeatherError::Status { status, .. } if *status >= 500 => {
                "Weather service unavailable"
            }
            WeatherError::Status { .. } => "Weather request failed",
            WeatherError::InvalidApiKey => "Weather API key is invalid",
            WeatherError::Decode(_) => "Unexpected weather response",
            WeatherError::Config(_) => "Weather is not configured",
        }
    }
}
