//! Which weather providers are enabled, and with which credentials.

use std::sync::Arc;

use log::{info, warn};

use routecast_weather_data::{
    OpenMeteoProvider, OpenWeatherMapProvider, WeatherApiProvider, WeatherProvider,
};

pub const ENV_OPENWEATHERMAP_API_KEY: &str = "ROUTECAST_OPENWEATHERMAP_API_KEY";
pub const ENV_WEATHERAPI_API_KEY: &str = "ROUTECAST_WEATHERAPI_API_KEY";
pub const ENV_ENABLE_OPEN_METEO: &str = "ROUTECAST_ENABLE_OPEN_METEO";

/// Provider enablement and priorities. Lower priority values are preferred.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub open_meteo_enabled: bool,
    pub open_meteo_priority: u8,
    pub openweathermap_api_key: Option<String>,
    pub openweathermap_priority: u8,
    pub weatherapi_api_key: Option<String>,
    pub weatherapi_priority: u8,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            open_meteo_enabled: true,
            open_meteo_priority: 1,
            openweathermap_api_key: None,
            openweathermap_priority: 2,
            weatherapi_api_key: None,
            weatherapi_priority: 3,
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys stay out of logs
        f.debug_struct("ProviderSettings")
            .field("open_meteo_enabled", &self.open_meteo_enabled)
            .field(
                "openweathermap_api_key",
                &self.openweathermap_api_key.as_ref().map(|_| "***"),
            )
            .field(
                "weatherapi_api_key",
                &self.weatherapi_api_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

impl ProviderSettings {
    /// Read provider settings from `ROUTECAST_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read provider settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let open_meteo_enabled = match non_empty(ENV_ENABLE_OPEN_METEO) {
            None => true,
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    warn!("Ignoring invalid {}={}", ENV_ENABLE_OPEN_METEO, other);
                    true
                }
            },
        };

        Self {
            open_meteo_enabled,
            openweathermap_api_key: non_empty(ENV_OPENWEATHERMAP_API_KEY),
            weatherapi_api_key: non_empty(ENV_WEATHERAPI_API_KEY),
            ..Self::default()
        }
    }

    /// Instantiate every enabled provider.
    pub fn build_providers(&self) -> Vec<Arc<dyn WeatherProvider>> {
        let mut providers: Vec<Arc<dyn WeatherProvider>> = Vec::new();

        if self.open_meteo_enabled {
            providers.push(Arc::new(
                OpenMeteoProvider::new().with_priority(self.open_meteo_priority),
            ));
        }
        if let Some(key) = &self.openweathermap_api_key {
            providers.push(Arc::new(
                OpenWeatherMapProvider::new(key.clone()).with_priority(self.openweathermap_priority),
            ));
        }
        if let Some(key) = &self.weatherapi_api_key {
            providers.push(Arc::new(
                WeatherApiProvider::new(key.clone()).with_priority(self.weatherapi_priority),
            ));
        }

        if providers.is_empty() {
            warn!("No weather providers enabled");
        } else {
            info!(
                "Enabled weather providers: {:?}",
                providers.iter().map(|p| p.id()).collect::<Vec<_>>()
            );
        }

        providers
    }
}
