//! OpenWeatherMap provider.
//!
//! Uses the current weather endpoint (`/data/2.5/weather`) with
//! `units=metric`. The API does not report dew point, so it is derived.

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
pub const PROVIDER_ID: &str = "OPENWEATHERMAP";

const BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    main: MainBlock,
    wind: Option<WindBlock>,
    clouds: Option<CloudsBlock>,
    rain: Option<PrecipBlock>,
    snow: Option<PrecipBlock>,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: Option<f64>,
    pressure: Option<f64>,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CloudsBlock {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PrecipBlock {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

/// OpenWeatherMap current-conditions adapter.
///
/// # Example
///
/// ```ignore
/// use routecast_weather_data::provider::openweathermap::OpenWeatherMapProvider;
///
/// let provider = OpenWeatherMapProvider::new("your_api_key".to_string());
/// ```
pub struct OpenWeatherMapProvider {
    client: Client,
    api_key: String,
    base_url: String,
    priority: u8,
}

impl OpenWeatherMapProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: BASE_URL.to_string(),
            priority: 2,
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
impl WeatherProvider for OpenWeatherMapProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn rate_limit(&self) -> RateLimit {
        // Free plan: 60 calls/minute, 1,000 calls/day
        RateLimit {
            requests_per_minute: 60,
            requests_per_day: 1_000,
        }
    }

    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSample, WeatherDataError> {
        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));
        debug!("Fetching OpenWeatherMap current weather at {}", coords);

        let request = self.client.get(&url).query(&[
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        let body: CurrentResponse = get_json(PROVIDER_ID, request).await?;

        let mut sample = WeatherSample::new(PROVIDER_ID, body.main.temp, body.main.humidity);
        sample.feels_like = body.main.feels_like.unwrap_or(body.main.temp);
        sample.pressure = body.main.pressure.unwrap_or(sample.pressure);
        if let Some(wind) = body.wind {
            sample.wind_speed = wind.speed.unwrap_or(0.0);
            sample.wind_deg = wind.deg.unwrap_or(0.0);
        }
        sample.cloud_cover = body.clouds.and_then(|c| c.all).unwrap_or(0.0);

        // Rain and snow are reported separately as liquid-equivalent mm
        let rain = body.rain.and_then(|r| r.one_hour).unwrap_or(0.0);
        let snow = body.snow.and_then(|s| s.one_hour).unwrap_or(0.0);
        sample.precipitation_1h = rain + snow;

        sample.condition_code = body
            .weather
            .first()
            .map(|w| WeatherCondition::from_owm_id(w.id))
            .unwrap_or_default();
        sample.fetched_at = Utc::now();

        Ok(sample)
    }
}
