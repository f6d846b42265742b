//! Activity error types.

use thiserror::Error;

use crate::types::Metric;

/// Errors reported by a health store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HealthStoreError {
    /// No samples in the requested range. Callers treat this as zero.
    #[error("No data for the requested range")]
    NoData,

    /// Read access was not granted. Callers treat this as zero.
    #[error("Health data access denied")]
    AuthorizationDenied,

    #[error("Health store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActivityError {
    #[error("{metric} query failed: {message}")]
    Query { metric: Metric, message: String },

    #[error("Health store error: {0}")]
    Store(String),
}

impl ActivityError {
    pub fn query(metric: Metric, source: &HealthStoreError) -> Self {
        Self::Query {
            metric,
            message: source.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Query { .. } => "Activity data unavailable",
            Self::Store(_) => "Health data is not accessible",
        }
    }
}
