//! OpenWeatherMap current-conditions client.

use std::sync::Arc;
use std::time::Duration;

use glance_core::ReqwestErrorExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{DisplayIcon, Location, Weather, WeatherError, MISSING_PROVIDER_ICON};

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
    #[serde(default)]
    weather: Vec<ConditionEntry>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    icon: Option<String>,
}

impl From<WeatherResponse> for Weather {
    fn from(resp: WeatherResponse) -> Self {
        let provider_icon = resp.weather.into_iter().next().and_then(|c| c.icon);

        match provider_icon {
            Some(code) => Weather {
                display_icon: DisplayIcon::from_provider_code(&code),
                provider_icon: code,
                temperature_celsius: resp.main.temp,
            },
            None => Weather {
                display_icon: DisplayIcon::Unknown,
                provider_icon: MISSING_PROVIDER_ICON.to_string(),
                temperature_celsius: resp.main.temp,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn request_url(&self, location: &Location) -> String {
        format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, location.latitude, location.longitude, self.api_key
        )
    }

    /// Fetch current conditions at `location`. One request, no retry.
    #[instrument(skip(self), level = "info")]
    pub async fn get_weather(&self, location: &Location) -> Result<Weather, WeatherError> {
        if self.api_key.trim().is_empty() {
            return Err(WeatherError::Config("missing API key".to_string()));
        }

        let response = self
            .client
            .get(self.request_url(location))
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let body: WeatherResponse = self.handle_response(response).await?;
        let weather = Weather::from(body);

        tracing::debug!(
            "Weather: {} ({}) {:.1}°C",
            weather.display_icon,
            weather.provider_icon,
            weather.temperature_celsius
        );
        Ok(weather)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| WeatherError::Network(e.into_network_error()))?;
            serde_json::from_str(&text).map_err(|e| WeatherError::Decode(e.to_string()))
        } else if status.as_u16() == 401 {
            Err(WeatherError::InvalidApiKey)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(WeatherError::Status {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::NetworkError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        WeatherClient::new(&server.uri(), "test_key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_weather() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "47.6"))
            .and(query_param("lon", "-122.3"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": {"temp": 12.7, "humidity": 80},
                "weather": [{"id": 800, "main": "Clear", "icon": "01n"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let weather = client_for(&mock_server)
            .get_weather(&Location::new(47.6, -122.3))
            .await
            .unwrap();

        assert_eq!(weather.display_icon, DisplayIcon::SunMax);
        assert_eq!(weather.provider_icon, "01n");
        assert_eq!(weather.temperature_celsius, 12.7);
    }

    #[tokio::test]
    async fn test_unmapped_icon() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": {"temp": -3.0},
                "weather": [{"icon": "77x"}]
            })))
            .mount(&mock_server)
            .await;

        let weather = client_for(&mock_server)
            .get_weather(&Location::new(0.0, 0.0))
            .await
            .unwrap();

        assert_eq!(weather.display_icon, DisplayIcon::Unknown);
        assert_eq!(weather.provider_icon, "77x");
    }

    #[tokio::test]
    async fn test_missing_condition_entry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": {"temp": 20.0},
                "weather": []
            })))
            .mount(&mock_server)
            .await;

        let weather = client_for(&mock_server)
            .get_weather(&Location::new(0.0, 0.0))
            .await
            .unwrap();

        assert_eq!(weather.display_icon, DisplayIcon::Unknown);
        assert_eq!(weather.provider_icon, MISSING_PROVIDER_ICON);
        assert_eq!(weather.temperature_celsius, 20.0);
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .get_weather(&Location::new(0.0, 0.0))
            .await;

        assert!(matches!(result, Err(WeatherError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .get_weather(&Location::new(0.0, 0.0))
            .await;

        match result {
            Err(WeatherError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"main\": {}}"))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .get_weather(&Location::new(0.0, 0.0))
            .await;

        assert!(matches!(result, Err(WeatherError::Decode(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = WeatherClient::new(&mock_server.uri(), "", Duration::from_secs(5)).unwrap();
        let result = client.get_weather(&Location::new(0.0, 0.0)).await;

        assert!(matches!(result, Err(WeatherError::Config(_))));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client =
            WeatherClient::new("http://127.0.0.1:1", "test_key", Duration::from_secs(5)).unwrap();
        let result = client.get_weather(&Location::new(0.0, 0.0)).await;

        assert!(matches!(
            result,
            Err(WeatherError::Network(NetworkError::ConnectionFailed(_)))
        ));
    }

    #[test]
    fn test_request_url_trims_trailing_slash() {
        let client = WeatherClient::with_client(Client::new(), "https://example.com/data/", "k");
        assert_eq!(
            client.request_url(&Location::new(1.5, -2.25)),
            "https://example.com/data/weather?lat=1.5&lon=-2.25&appid=k&units=metric"
        );
    }
}
