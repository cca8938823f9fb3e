//! Weather provider implementations.
//!
//! This module contains the provider trait definitions and all provider
//! implementations for fetching current conditions from external sources.

pub mod capabilities;
pub mod http;
pub mod traits;

pub mod open_meteo;
pub mod openweathermap;
pub mod weatherapi;

pub use capabilities::RateLimit;
pub use traits::WeatherProvider;

pub use open_meteo::OpenMeteoProvider;
pub use openweathermap::OpenWeatherMapProvider;
pub use weatherapi::WeatherApiProvider;
