//! Routecast Core - route sampling, caching, progressive delivery and the
//! forecast service.
//!
//! Provider access (adapters, rate limiting, retries, consensus) lives in
//! `routecast-weather-data`; this crate turns a route into per-point
//! forecasts on top of it:
//!
//! ```text
//! Route + ForecastSettings
//!   -> RouteSampler            (routes)
//!   -> ForecastCache lookup    (cache)
//!   -> ProviderRegistry fetch  (weather-data, per point)
//!   -> ConsensusAggregator     (weather-data, multi-source)
//!   -> alerts, units           (alerts, forecast)
//!   -> ForecastCache store
//! ```
//!
//! Long routes are processed in chunks by the
//! [`ProgressiveChunkCoordinator`](progressive::ProgressiveChunkCoordinator).

pub mod alerts;
pub mod cache;
pub mod constants;
pub mod errors;
pub mod forecast;
pub mod progressive;
pub mod routes;
pub mod settings;

pub use forecast::{
    ForecastRequest, ForecastResponse, WeatherForecast, WeatherForecastService,
    WeatherForecastServiceTrait,
};
pub use routes::{RawPoint, Route, RoutePoint, RouteSampler};
pub use settings::{ForecastPreferences, ForecastSettings, ServiceConfig};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
