//! Today's activity totals for Glance.
//!
//! Step count and active energy come from a [`HealthStore`] through two
//! cumulative-sum queries over the local calendar day.

pub mod client;
pub mod error;
pub mod store;
pub mod types;

pub use client::ActivityClient;
pub use error::{ActivityError, HealthStoreError};
pub use store::{FileHealthStore, HealthSample, HealthStore};
pub use types::{Activity, DayWindow, Metric, Quantity, Unit};
