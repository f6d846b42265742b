//! Concurrent weather + activity aggregation with per-branch fallback.

use std::time::Duration;

use chrono::{DateTime, Utc};
use glance_activity::{Activity, ActivityClient, ActivityError};
use glance_weather::{LocationClient, LocationError, Weather, WeatherClient, WeatherError};
use thiserror::Error;
use tracing::instrument;

use crate::types::Snapshot;

/// Default upper bound for each branch before its fallback is used
pub const DEFAULT_BRANCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The two independently supervised halves of an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Weather,
    Activity,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Branch::Weather => f.write_str("weather"),
            Branch::Activity => f.write_str("activity"),
        }
    }
}

/// Why a branch fell back to its sample value
#[derive(Debug, Error)]
pub enum BranchError {
    #[error("Location: {0}")]
    Location(#[from] LocationError),

    #[error("Weather: {0}")]
    Weather(#[from] WeatherError),

    #[error("Activity: {0}")]
    Activity(#[from] ActivityError),

    #[error("{0} timed out")]
    TimedOut(Branch),
}

impl BranchError {
    /// Short text for the interactive view
    pub fn user_message(&self) -> &'static str {
        match self {
            BranchError::Location(e) => e.user_message(),
            BranchError::Weather(e) => e.user_message(),
            BranchError::Activity(e) => e.user_message(),
            BranchError::TimedOut(_) => "No answer in time",
        }
    }
}

/// Raw per-branch outcome of one aggregation, for surfaces that show errors.
#[derive(Debug)]
pub struct SnapshotReport {
    pub timestamp: DateTime<Utc>,
    pub weather: Result<Weather, BranchError>,
    pub activity: Result<Activity, BranchError>,
}

impl SnapshotReport {
    /// Replace each failed branch with its sample value.
    pub fn into_snapshot(self) -> Snapshot {
        let weather = self.weather.unwrap_or_else(|e| {
            tracing::warn!("Weather unavailable, using sample: {}", e);
            Weather::sample()
        });
        let activity = self.activity.unwrap_or_else(|e| {
            tracing::warn!("Activity unavailable, using sample: {}", e);
            Activity::SAMPLE
        });

        Snapshot {
            timestamp: self.timestamp,
            weather,
            activity,
        }
    }
}

#[derive(Clone)]
pub struct SnapshotAggregator {
    location: LocationClient,
    weather: WeatherClient,
    activity: ActivityClient,
    branch_timeout: Duration,
}

impl SnapshotAggregator {
    pub fn new(location: LocationClient, weather: WeatherClient, activity: ActivityClient) -> Self {
        Self {
            location,
            weather,
            activity,
            branch_timeout: DEFAULT_BRANCH_TIMEOUT,
        }
    }

    pub fn with_branch_timeout(mut self, timeout: Duration) -> Self {
        self.branch_timeout = timeout;
        self
    }

    /// Build a snapshot. Never fails: a failed branch gets its sample value.
    pub async fn build_snapshot(&self) -> Snapshot {
        self.fetch_report().await.into_snapshot()
    }

    /// Run both branches concurrently and keep their raw outcomes.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_report(&self) -> SnapshotReport {
        let timestamp = Utc::now();

        let (weather, activity) = tokio::join!(self.weather_branch(), self.activity_branch());

        SnapshotReport {
            timestamp,
            weather,
            activity,
        }
    }

    async fn weather_branch(&self) -> Result<Weather, BranchError> {
        let fetch = async {
            let location = self.location.get_location().await?;
            let weather = self.weather.get_weather(&location).await?;
            Ok::<_, BranchError>(weather)
        };

        match tokio::time::timeout(self.branch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(BranchError::TimedOut(Branch::Weather)),
        }
    }

    async fn activity_branch(&self) -> Result<Activity, BranchError> {
        match tokio::time::timeout(self.branch_timeout, self.activity.get_activity()).await {
            Ok(result) => result.map_err(BranchError::from),
            Err(_) => Err(BranchError::TimedOut(Branch::Activity)),
        }
    }
}
