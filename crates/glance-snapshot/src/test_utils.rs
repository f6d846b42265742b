//! Fake collaborators shared by the unit tests in this crate.
#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use glance_activity::{
    ActivityClient, DayWindow, HealthStore, HealthStoreError, Metric, Quantity, Unit,
};
use glance_weather::{
    FixedLocationSource, Location, LocationClient, LocationDelegate, LocationError,
    LocationSource, WeatherClient,
};

/// Answers every query with fixed totals, optionally after a delay.
pub struct StaticStore {
    steps: Result<f64, HealthStoreError>,
    kilocalories: Result<f64, HealthStoreError>,
    delay: Duration,
    queries: AtomicUsize,
}

impl StaticStore {
    pub fn new(
        steps: Result<f64, HealthStoreError>,
        kilocalories: Result<f64, HealthStoreError>,
    ) -> Self {
        Self {
            steps,
            kilocalories,
            delay: Duration::ZERO,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthStore for StaticStore {
    async fn request_authorization(&self, _metrics: &[Metric]) -> Result<bool, HealthStoreError> {
        Ok(true)
    }

    async fn cumulative_sum(
        &self,
        metric: Metric,
        _window: DayWindow,
    ) -> Result<Option<Quantity>, HealthStoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match metric {
            Metric::StepCount => self
                .steps
                .clone()
                .map(|v| Some(Quantity::new(v, Unit::Count))),
            Metric::ActiveEnergyBurned => self
                .kilocalories
                .clone()
                .map(|v| Some(Quantity::new(v, Unit::Kilocalorie))),
        }
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowStore {
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl HealthStore for SlowStore {
    async fn request_authorization(&self, _metrics: &[Metric]) -> Result<bool, HealthStoreError> {
        Ok(true)
    }

    async fn cumulative_sum(
        &self,
        _metric: Metric,
        _window: DayWindow,
    ) -> Result<Option<Quantity>, HealthStoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }
}

pub fn activity_client(
    steps: Result<f64, HealthStoreError>,
    kilocalories: Result<f64, HealthStoreError>,
) -> ActivityClient {
    ActivityClient::new(Arc::new(StaticStore::new(steps, kilocalories)))
}

struct FailingSource(LocationError);

impl LocationSource for FailingSource {
    fn request_location(&self, delegate: LocationDelegate) {
        delegate.did_fail(self.0.clone());
    }
}

/// Keeps every delegate alive without ever answering.
#[derive(Default)]
pub struct HangingSource {
    pending: Mutex<Vec<LocationDelegate>>,
}

impl LocationSource for HangingSource {
    fn request_location(&self, delegate: LocationDelegate) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(delegate);
        }
    }
}

pub fn failing_location(error: LocationError) -> LocationClient {
    LocationClient::new(Arc::new(FailingSource(error)))
}

pub fn fixed_location() -> LocationClient {
    LocationClient::new(Arc::new(FixedLocationSource::new(Location::new(
        59.33, 18.07,
    ))))
}

/// A weather client with no API key: fails fast without touching the network.
pub fn offline_weather() -> WeatherClient {
    WeatherClient::new("http://127.0.0.1:1", "", Duration::from_secs(1)).unwrap()
}
