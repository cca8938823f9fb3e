//! WeatherAPI.com provider.
//!
//! Uses `/v1/current.json`. Wind is reported in km/h and converted to m/s.

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
pub const PROVIDER_ID: &str = "WEATHERAPI";

const BASE_URL: &str = "https://api.weatherapi.com";

const KPH_TO_MS: f64 = 1.0 / 3.6;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temp_c: f64,
    feelslike_c: Option<f64>,
    humidity: f64,
    pressure_mb: Option<f64>,
    wind_kph: Option<f64>,
    wind_degree: Option<f64>,
    cloud: Option<f64>,
    precip_mm: Option<f64>,
    dewpoint_c: Option<f64>,
    condition: Option<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    code: i32,
}

/// WeatherAPI.com current-conditions adapter.
pub struct WeatherApiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    priority: u8,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: BASE_URL.to_string(),
            priority: 3,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn rate_limit(&self) -> RateLimit {
        // Free tier is 1M calls/month
        RateLimit {
            requests_per_minute: 100,
            requests_per_day: 30_000,
        }
    }

    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSample, WeatherDataError> {
        let url = format!("{}/v1/current.json", self.base_url.trim_end_matches('/'));
        debug!("Fetching WeatherAPI current weather at {}", coords);

        let request = self.client.get(&url).query(&[
            ("key", self.api_key.clone()),
            ("q", format!("{},{}", coords.lat, coords.lon)),
            ("aqi", "no".to_string()),
        ]);

        let body: CurrentResponse = get_json(PROVIDER_ID, request).await?;
        let current = body.current;

        let mut sample = WeatherSample::new(PROVIDER_ID, current.temp_c, current.humidity)
            .with_reported_dew_point(current.dewpoint_c);
        sample.feels_like = current.feelslike_c.unwrap_or(current.temp_c);
        sample.pressure = current.pressure_mb.unwrap_or(sample.pressure);
        sample.wind_speed = current.wind_kph.unwrap_or(0.0) * KPH_TO_MS;
        sample.wind_deg = current.wind_degree.unwrap_or(0.0);
        sample.cloud_cover = current.cloud.unwrap_or(0.0);
        sample.precipitation_1h = current.precip_mm.unwrap_or(0.0);
        sample.condition_code = current
            .condition
            .map(|c| WeatherCondition::from_weatherapi_code(c.code))
            .unwrap_or_default();
        sample.fetched_at = Utc::now();

        Ok(sample)
    }
}
