//! Periodic refresh.
//!
//! One aggregation runs as soon as the scheduler starts, then one per
//! interval. Each run is its own task: a slow run never delays the next tick,
//! and overlapping runs are allowed. Stopping only prevents new runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::aggregator::{SnapshotAggregator, SnapshotReport};
use crate::types::Snapshot;

/// Shortest accepted refresh interval
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Presentation collaborator that receives each new snapshot.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: Snapshot);

    /// Receives the raw report. Surfaces that show per-branch errors
    /// override this; the default applies the fallbacks and publishes.
    fn publish_report(&self, report: SnapshotReport) {
        self.publish(report.into_snapshot());
    }
}

impl SnapshotSink for mpsc::UnboundedSender<Snapshot> {
    fn publish(&self, snapshot: Snapshot) {
        if self.send(snapshot).is_err() {
            tracing::debug!("Snapshot receiver dropped");
        }
    }
}

pub struct RefreshScheduler {
    aggregator: Arc<SnapshotAggregator>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
    cancel: CancellationToken,
    tracker: TaskTracker,
    ticks: Arc<AtomicU64>,
}

impl RefreshScheduler {
    /// Start refreshing: once now, then every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        aggregator: Arc<SnapshotAggregator>,
        sink: Arc<dyn SnapshotSink>,
        interval: Duration,
    ) -> Self {
        let interval = if interval < MIN_INTERVAL {
            tracing::warn!(
                "Refresh interval {:?} is too short, using {:?}",
                interval,
                MIN_INTERVAL
            );
            MIN_INTERVAL
        } else {
            interval
        };

        let scheduler = Self {
            aggregator,
            sink,
            interval,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            ticks: Arc::new(AtomicU64::new(0)),
        };
        scheduler.spawn_timer();

        tracing::info!("Refresh scheduler started, every {:?}", interval);
        scheduler
    }

    fn spawn_timer(&self) {
        let cancel = self.cancel.clone();
        let tracker = self.tracker.clone();
        let aggregator = self.aggregator.clone();
        let sink = self.sink.clone();
        let ticks = self.ticks.clone();
        let period = self.interval;

        self.tracker.spawn(async move {
            let mut timer = tokio::time::interval(period);
            // A late tick shifts the schedule instead of bursting.
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {
                        spawn_refresh(&tracker, &aggregator, &sink, &ticks);
                    }
                }
            }

            tracing::debug!("Refresh timer stopped");
        });
    }

    /// Run one extra aggregation now, outside the schedule.
    ///
    /// Ignored once the scheduler is stopped.
    pub fn refresh_now(&self) {
        if self.is_stopped() {
            tracing::debug!("Ignoring refresh request on a stopped scheduler");
            return;
        }
        spawn_refresh(&self.tracker, &self.aggregator, &self.sink, &self.ticks);
    }

    /// Stop future runs. Runs already in flight still publish.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Refresh scheduler stopped after {} runs", self.ticks());
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of aggregations started so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop, then wait for in-flight runs to publish.
    pub async fn shutdown(&self) {
        self.stop();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_refresh(
    tracker: &TaskTracker,
    aggregator: &Arc<SnapshotAggregator>,
    sink: &Arc<dyn SnapshotSink>,
    ticks: &Arc<AtomicU64>,
) {
    let run = ticks.fetch_add(1, Ordering::SeqCst) + 1;
    let aggregator = aggregator.clone();
    let sink = sink.clone();

    tracker.spawn(async move {
        tracing::debug!("Refresh #{} started", run);
        let report = aggregator.fetch_report().await;
        sink.publish_report(report);
        tracing::debug!("Refresh #{} published", run);
    });
}
