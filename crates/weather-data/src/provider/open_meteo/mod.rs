//! Open-Meteo provider.
//!
//! Free, keyless API backed by national weather services. Reports WMO weather
//! codes and, with `wind_speed_unit=ms`, every value already in canonical
//! metric units.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::WeatherDataError;
use crate::models::{Coordinates, WeatherCondition, WeatherSample};
use crate::provider::http::{build_client, get_json};
use crate::provider::{RateLimit, WeatherProvider};

/// Provider ID constant
pub const PROVIDER_ID: &str = "OPEN_METEO";

const BASE_URL: &str = "https://api.open-meteo.com";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,weather_code,cloud_cover,pressure_msl,wind_speed_10m,wind_direction_10m,dew_point_2m";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<i32>,
    cloud_cover: Option<f64>,
    pressure_msl: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    dew_point_2m: Option<f64>,
}

/// Open-Meteo current-conditions adapter.
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    priority: u8,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(),
            base_url: BASE_URL.to_string(),
            priority: 1,
        }
    }

    /// Point the adapter at a different host (mirrors, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn rate_limit(&self) -> RateLimit {
        // Non-commercial terms: 600/min, 10k/day
        RateLimit {
            requests_per_minute: 600,
            requests_per_day: 10_000,
        }
    }

    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSample, WeatherDataError> {
        let url = format!("{}/v1/forecast", self.base_url.trim_end_matches('/'));
        debug!("Fetching Open-Meteo current weather at {}", coords);

        let request = self.client.get(&url).query(&[
            ("latitude", coords.lat.to_string()),
            ("longitude", coords.lon.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", "UTC".to_string()),
        ]);

        let body: ForecastResponse = get_json(PROVIDER_ID, request).await?;
        let current = body.current;

        let mut sample = WeatherSample::new(
            PROVIDER_ID,
            current.temperature_2m,
            current.relative_humidity_2m,
        )
        .with_reported_dew_point(current.dew_point_2m);

        sample.feels_like = current.apparent_temperature.unwrap_or(current.temperature_2m);
        sample.pressure = current.pressure_msl.unwrap_or(sample.pressure);
        sample.wind_speed = current.wind_speed_10m.unwrap_or(0.0);
        sample.wind_deg = current.wind_direction_10m.unwrap_or(0.0);
        sample.cloud_cover = current.cloud_cover.unwrap_or(0.0);
        sample.precipitation_1h = current.precipitation.unwrap_or(0.0);
        sample.condition_code = current
            .weather_code
            .map(WeatherCondition::from_wmo_code)
            .unwrap_or_default();
        sample.fetched_at = Utc::now();

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coords() -> Coordinates {
        Coordinates::new(45.5017, -73.5673)
    }

    #[tokio::test]
    async fn test_fetch_current_normalizes_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("wind_speed_unit", "ms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 45.5,
                "longitude": -73.56,
                "current": {
                    "time": "2025-06-01T08:00",
                    "temperature_2m": 18.4,
                    "relative_humidity_2m": 72.0,
                    "apparent_temperature": 17.9,
                    "precipitation": 0.4,
                    "weather_code": 61,
                    "cloud_cover": 88.0,
                    "pressure_msl": 1008.2,
                    "wind_speed_10m": 4.1,
                    "wind_direction_10m": 230.0,
                    "dew_point_2m": 13.2
                }
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenMeteoProvider::new().with_base_url(mock_server.uri());
        let sample = provider.fetch_current(coords()).await.unwrap();

        assert_eq!(sample.provider_id, PROVIDER_ID);
        assert_eq!(sample.temp, 18.4);
        assert_eq!(sample.feels_like, 17.9);
        assert_eq!(sample.pressure, 1008.2);
        assert_eq!(sample.wind_speed, 4.1);
        assert_eq!(sample.precipitation_1h, 0.4);
        assert_eq!(sample.dew_point, 13.2);
        assert_eq!(sample.condition_code, WeatherCondition::Rain);
    }

    #[tokio::test]
    async fn test_missing_dew_point_is_derived() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current": {
                    "temperature_2m": 20.0,
                    "relative_humidity_2m": 60.0,
                    "weather_code": 0
                }
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenMeteoProvider::new().with_base_url(mock_server.uri());
        let sample = provider.fetch_current(coords()).await.unwrap();

        assert!((sample.dew_point - crate::models::dew_point(20.0, 60.0)).abs() < 1e-9);
        assert_eq!(sample.condition_code, WeatherCondition::Clear);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = OpenMeteoProvider::new().with_base_url(mock_server.uri());
        let err = provider.fetch_current(coords()).await.unwrap_err();

        assert!(matches!(
            err,
            WeatherDataError::Upstream {
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_parse() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&mock_server)
            .await;

        let provider = OpenMeteoProvider::new().with_base_url(mock_server.uri());
        let err = provider.fetch_current(coords()).await.unwrap_err();

        assert!(matches!(err, WeatherDataError::Parse { .. }));
    }
}
