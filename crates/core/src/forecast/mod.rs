//! Forecast orchestration and its request/response model.

mod model;
mod service;
#[cfg(test)]
mod service_tests;
mod units;

pub use model::{
    FailureKind, ForecastRequest, ForecastResponse, ForecastStatus, ProviderFailure,
    WeatherForecast,
};
pub use service::{WeatherForecastService, WeatherForecastServiceTrait};
pub use units::{apply_units, celsius_to_fahrenheit, mm_to_inches, ms_to_mph};
