//! Shared error types for the Glance workspace.
//!
//! Domain crates (weather, activity) define their own error enums and reuse
//! [`NetworkError`] for transport failures. [`ConfigError`] travels inside
//! `anyhow` from config loading to the binary.

use thiserror::Error;

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Client setup failed: {0}")]
    ClientSetup(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Offline",
            NetworkError::Timeout => "Request timed out",
            NetworkError::ServerError { status, .. } if *status >= 500 => "Service is down",
            NetworkError::ServerError { .. } => "Request failed",
            NetworkError::InvalidResponse(_) => "Unexpected response",
            NetworkError::ClientSetup(_) => "Network setup failed",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("No configuration directory on this platform")]
    NoConfigDir,
}

/// Classifies transport failures from `reqwest`.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_builder() {
            return NetworkError::ClientSetup(self.to_string());
        }
        if let Some(status) = self.status() {
            return NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            };
        }
        if self.is_decode() || self.is_body() {
            return NetworkError::InvalidResponse(self.to_string());
        }
        NetworkError::ConnectionFailed(self.to_string())
    }
}
