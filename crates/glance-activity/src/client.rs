//! Reads today's step count and active energy from a health store.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::instrument;

use crate::error::{ActivityError, HealthStoreError};
use crate::store::HealthStore;
use crate::types::{Activity, DayWindow, Metric, Quantity};

type WindowSource = Arc<dyn Fn() -> DayWindow + Send + Sync>;

#[derive(Clone)]
pub struct ActivityClient {
    store: Arc<dyn HealthStore>,
    window_source: WindowSource,
    authorization: Arc<OnceCell<()>>,
}

impl ActivityClient {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self::with_window_source(store, DayWindow::today)
    }

    /// Use `window_source` instead of the local clock to pick "today".
    pub fn with_window_source(
        store: Arc<dyn HealthStore>,
        window_source: impl Fn() -> DayWindow + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            window_source: Arc::new(window_source),
            authorization: Arc::new(OnceCell::new()),
        }
    }

    /// Requests read access the first time it's called.
    ///
    /// A denial is only logged: stores answer queries they can't serve with
    /// no data, so the totals still resolve.
    async fn ensure_authorized(&self) {
        self.authorization
            .get_or_init(|| async {
                match self.store.request_authorization(&Metric::ALL).await {
                    Ok(true) => tracing::info!("Health data authorization granted"),
                    Ok(false) => tracing::warn!("Health data authorization denied"),
                    Err(e) => tracing::warn!("Health data authorization failed: {}", e),
                }
            })
            .await;
    }

    /// Step count and active energy for the local calendar day.
    ///
    /// Both queries run to completion; the call fails if either one failed.
    #[instrument(skip(self), level = "info")]
    pub async fn get_activity(&self) -> Result<Activity, ActivityError> {
        self.ensure_authorized().await;

        let window = (self.window_source)();
        let (steps, calories) = tokio::join!(
            self.cumulative(Metric::StepCount, window),
            self.cumulative(Metric::ActiveEnergyBurned, window),
        );

        let activity = Activity {
            steps: steps?,
            calories: calories?,
        };
        tracing::debug!("Activity: {} steps, {} kcal", activity.steps, activity.calories);
        Ok(activity)
    }

    /// Runs one cumulative-sum query and truncates the total to an integer.
    /// No samples, or no permission to read them, counts as zero.
    async fn cumulative(&self, metric: Metric, window: DayWindow) -> Result<i64, ActivityError> {
        let quantity = match self.store.cumulative_sum(metric, window).await {
            Ok(q) => q,
            Err(HealthStoreError::NoData) => None,
            Err(HealthStoreError::AuthorizationDenied) => {
                tracing::debug!("{} query not authorized, counting as no data", metric);
                None
            }
            Err(e @ HealthStoreError::Unavailable(_)) => {
                return Err(ActivityError::Store(e.to_string()));
            }
            Err(e) => return Err(ActivityError::query(metric, &e)),
        };

        let Some(quantity) = quantity else {
            tracing::debug!("No {} samples today", metric);
            return Ok(0);
        };

        let value = normalize(metric, &quantity).ok_or_else(|| ActivityError::Query {
            metric,
            message: format!("unexpected unit {:?}", quantity.unit),
        })?;

        Ok(value.max(0.0) as i64)
    }
}

fn normalize(metric: Metric, quantity: &Quantity) -> Option<f64> {
    match metric {
        Metric::StepCount => quantity.to_count(),
        Metric::ActiveEnergyBurned => quantity.to_kilocalories(),
    }
}
