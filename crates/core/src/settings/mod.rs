//! Request settings, preferences and service configuration.

mod config;
pub mod defaults;
mod forecast_settings;
mod preferences;
mod providers;

pub use config::*;
pub use forecast_settings::{ForecastSettings, Units};
pub use preferences::{ForecastMode, ForecastPreferences};
pub use providers::{
    ProviderSettings, ENV_ENABLE_OPEN_METEO, ENV_OPENWEATHERMAP_API_KEY, ENV_WEATHERAPI_API_KEY,
};
