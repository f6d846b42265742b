//! One-shot location requests.
//!
//! Platform location services report through callbacks. [`LocationClient`]
//! hands each request a fresh [`LocationDelegate`] and awaits the first
//! result it reports; anything reported after that is dropped.

use std::sync::Arc;
use std::time::Duration;

use glance_core::ReqwestErrorExt;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::instrument;

use crate::types::{Location, LocationError};

type Resolver = oneshot::Sender<Result<Location, LocationError>>;

/// Platform location service.
///
/// Implementations must eventually call one of the delegate's callbacks, or
/// drop it (which resolves the request as [`LocationError::ServiceUnavailable`]).
pub trait LocationSource: Send + Sync {
    fn request_location(&self, delegate: LocationDelegate);
}

/// Callback handle for a single location request.
///
/// Clones share the same request; the first callback wins.
#[derive(Clone)]
pub struct LocationDelegate {
    slot: Arc<Mutex<Option<Resolver>>>,
}

impl LocationDelegate {
    fn new() -> (Self, oneshot::Receiver<Result<Location, LocationError>>) {
        let (tx, rx) = oneshot::channel();
        let delegate = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (delegate, rx)
    }

    /// Report a batch of positions; the most recent (last) one is used.
    pub fn did_update_locations(&self, locations: &[Location]) {
        let result = locations.last().copied().ok_or(LocationError::NoFix);
        self.resolve(result);
    }

    pub fn did_fail(&self, error: LocationError) {
        self.resolve(Err(error));
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.lock().is_none()
    }

    fn resolve(&self, result: Result<Location, LocationError>) {
        let Some(tx) = self.slot.lock().take() else {
            tracing::debug!("Ignoring location callback for an already resolved request");
            return;
        };
        // The receiver is gone if the caller stopped waiting.
        let _ = tx.send(result);
    }
}

/// Resolves the current approximate position, once per call.
#[derive(Clone)]
pub struct LocationClient {
    source: Arc<dyn LocationSource>,
}

impl LocationClient {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self { source }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_location(&self) -> Result<Location, LocationError> {
        let (delegate, rx) = LocationDelegate::new();
        self.source.request_location(delegate);

        match rx.await {
            Ok(Ok(location)) => {
                tracing::debug!("Got location: {}, {}", location.latitude, location.longitude);
                Ok(location)
            }
            Ok(Err(e)) => {
                tracing::debug!("Location request failed: {}", e);
                Err(e)
            }
            Err(_) => Err(LocationError::ServiceUnavailable),
        }
    }
}

/// Reports a position taken from configuration.
#[derive(Debug, Clone)]
pub struct FixedLocationSource {
    location: Location,
}

impl FixedLocationSource {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl LocationSource for FixedLocationSource {
    fn request_location(&self, delegate: LocationDelegate) {
        delegate.did_update_locations(&[self.location]);
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from an ip-api.com compatible lookup.
#[derive(Debug, Clone)]
pub struct IpLocationSource {
    client: reqwest::Client,
    url: String,
}

impl IpLocationSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Other(e.into_network_error().to_string()))?;

        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn lookup(client: reqwest::Client, url: String) -> Result<Location, LocationError> {
        let response = client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::Other(e.into_network_error().to_string())
            }
        })?;

        if !response.status().is_success() {
            tracing::debug!("IP location lookup returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("Invalid lookup response: {}", e)))?;

        if body.status.as_deref() == Some("fail") {
            return Err(LocationError::Other(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Location::new(lat, lon)),
            _ => Err(LocationError::NoFix),
        }
    }
}

impl LocationSource for IpLocationSource {
    fn request_location(&self, delegate: LocationDelegate) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("IP location lookup requested outside a runtime");
            delegate.did_fail(LocationError::ServiceUnavailable);
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            match Self::lookup(client, url).await {
                Ok(location) => delegate.did_update_locations(&[location]),
                Err(e) => delegate.did_fail(e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Reports a success, then keeps calling back.
    struct ChattySource;

    impl LocationSource for ChattySource {
        fn request_location(&self, delegate: LocationDelegate) {
            delegate.did_update_locations(&[Location::new(1.0, 2.0), Location::new(3.0, 4.0)]);
            assert!(delegate.is_resolved());
            delegate.did_fail(LocationError::PermissionDenied);
            delegate.did_update_locations(&[Location::new(5.0, 6.0)]);
        }
    }

    struct SilentSource;

    impl LocationSource for SilentSource {
        fn request_location(&self, _delegate: LocationDelegate) {}
    }

    struct FailingSource(LocationError);

    impl LocationSource for FailingSource {
        fn request_location(&self, delegate: LocationDelegate) {
            delegate.did_fail(self.0.clone());
            delegate.did_update_locations(&[Location::new(1.0, 1.0)]);
        }
    }

    struct EmptyBatchSource;

    impl LocationSource for EmptyBatchSource {
        fn request_location(&self, delegate: LocationDelegate) {
            delegate.did_update_locations(&[]);
        }
    }

    #[tokio::test]
    async fn test_first_callback_wins() {
        let client = LocationClient::new(Arc::new(ChattySource));
        let location = client.get_location().await.unwrap();
        assert_eq!(location, Location::new(3.0, 4.0));
    }

    #[tokio::test]
    async fn test_failure_is_not_overwritten() {
        let client = LocationClient::new(Arc::new(FailingSource(LocationError::PermissionDenied)));
        let result = client.get_location().await;
        assert_eq!(result, Err(LocationError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_dropped_delegate_is_unavailable() {
        let client = LocationClient::new(Arc::new(SilentSource));
        let result = client.get_location().await;
        assert_eq!(result, Err(LocationError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn test_empty_batch_is_no_fix() {
        let client = LocationClient::new(Arc::new(EmptyBatchSource));
        assert_eq!(client.get_location().await, Err(LocationError::NoFix));
    }

    #[tokio::test]
    async fn test_fixed_source() {
        let client =
            LocationClient::new(Arc::new(FixedLocationSource::new(Location::new(59.3, 18.1))));
        assert_eq!(client.get_location().await, Ok(Location::new(59.3, 18.1)));
    }

    #[tokio::test]
    async fn test_ip_source_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 47.6062,
                "lon": -122.3321
            })))
            .mount(&mock_server)
            .await;

        let source = IpLocationSource::new(
            format!("{}/json", mock_server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let client = LocationClient::new(Arc::new(source));

        let location = client.get_location().await.unwrap();
        assert_eq!(location, Location::new(47.6062, -122.3321));
    }

    #[tokio::test]
    async fn test_ip_source_reported_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&mock_server)
            .await;

        let source = IpLocationSource::new(
            format!("{}/json", mock_server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let result = LocationClient::new(Arc::new(source)).get_location().await;

        assert_eq!(result, Err(LocationError::Other("private range".into())));
    }

    #[tokio::test]
    async fn test_ip_source_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let source = IpLocationSource::new(
            format!("{}/json", mock_server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let result = LocationClient::new(Arc::new(source)).get_location().await;

        assert_eq!(result, Err(LocationError::ServiceUnavailable));
    }
}
