//! Health data store contract and a JSON-file backed implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HealthStoreError;
use crate::types::{DayWindow, Metric, Quantity, Unit};

/// On-device health data store.
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Ask for read access to `metrics`. `Ok(false)` means the user declined.
    async fn request_authorization(&self, metrics: &[Metric]) -> Result<bool, HealthStoreError>;

    /// Total of `metric` over samples starting inside `window`.
    ///
    /// `Ok(None)` when there are no samples in range.
    async fn cumulative_sum(
        &self,
        metric: Metric,
        window: DayWindow,
    ) -> Result<Option<Quantity>, HealthStoreError>;
}

/// One recorded measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub metric: Metric,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: f64,
    pub unit: Unit,
}

/// Reads samples from a JSON array on disk, e.g. one exported by a phone or watch.
#[derive(Debug, Clone)]
pub struct FileHealthStore {
    path: PathBuf,
}

impl FileHealthStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_samples(&self) -> Result<Vec<HealthSample>, HealthStoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HealthStoreError::Unavailable(format!(
                    "{} not found",
                    self.path.display()
                )));
            }
            Err(e) => return Err(HealthStoreError::Unavailable(e.to_string())),
        };

        serde_json::from_str(&contents)
            .map_err(|e| HealthStoreError::Query(format!("Invalid samples file: {}", e)))
    }
}

/// Sums samples of one metric into its canonical unit (count or kcal).
fn sum_samples<'a>(
    metric: Metric,
    samples: impl Iterator<Item = &'a HealthSample>,
) -> Result<Option<Quantity>, HealthStoreError> {
    let mut total: Option<f64> = None;

    for sample in samples {
        let quantity = Quantity::new(sample.value, sample.unit);
        let value = match metric {
            Metric::StepCount => quantity.to_count(),
            Metric::ActiveEnergyBurned => quantity.to_kilocalories(),
        }
        .ok_or_else(|| {
            HealthStoreError::Query(format!("{} sample has unit {:?}", metric, sample.unit))
        })?;

        *total.get_or_insert(0.0) += value;
    }

    let unit = match metric {
        Metric::StepCount => Unit::Count,
        Metric::ActiveEnergyBurned => Unit::Kilocalorie,
    };
    Ok(total.map(|value| Quantity::new(value, unit)))
}

#[async_trait]
impl HealthStore for FileHealthStore {
    async fn request_authorization(&self, metrics: &[Metric]) -> Result<bool, HealthStoreError> {
        let readable = tokio::fs::metadata(&self.path).await.is_ok();
        tracing::debug!(
            "Authorization for {:?} against {}: {}",
            metrics,
            self.path.display(),
            readable
        );
        Ok(readable)
    }

    async fn cumulative_sum(
        &self,
        metric: Metric,
        window: DayWindow,
    ) -> Result<Option<Quantity>, HealthStoreError> {
        let samples = self.read_samples().await?;

        // Strict start date: a sample counts when it starts inside the window.
        let in_window = samples
            .iter()
            .filter(|s| s.metric == metric && window.contains(s.start));

        sum_samples(metric, in_window)
    }
}
