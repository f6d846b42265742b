//! Weather for Glance
//!
//! Resolves the current position through a one-shot location request and
//! fetches current conditions from an OpenWeatherMap-compatible API.

pub mod location;
pub mod provider;
pub mod types;

pub use location::{
    FixedLocationSource, IpLocationSource, LocationClient, LocationDelegate, LocationSource,
};
pub use provider::WeatherClient;
pub use types::*;
