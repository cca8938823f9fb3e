//! Routecast Weather Data Crate
//!
//! This crate provides provider-agnostic acquisition of current weather
//! conditions for the Routecast forecast pipeline.
//!
//! # Overview
//!
//! The weather data crate supports:
//! - Multiple providers: Open-Meteo, OpenWeatherMap, WeatherAPI.com
//! - A shared condition taxonomy and canonical metric samples
//! - Fixed-window rate limiting per provider (and per client)
//! - Timeouts and retries through a single executor
//! - Multi-source consensus with agreement scoring and outlier detection
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  Coordinates     |
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | ProviderRegistry | --> |   RateLimiter    |  (fail closed)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |  retry::execute  |  (timeout per attempt, backoff)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | WeatherProvider  |  (Open-Meteo, OpenWeatherMap, WeatherAPI)
//! +------------------+
//!          |
//!          v
//! +--------------------+
//! | ConsensusAggregator|  (multi-source merge)
//! +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`WeatherSample`] - Canonical per-provider reading
//! - [`WeatherCondition`] - Shared condition taxonomy
//! - [`ConsensusWeather`] - Merged reading with agreement score
//! - [`ProviderRegistry`] - Gated, retried provider fan-out
//!
//! # Type Aliases
//!
//! - [`ProviderId`] - Provider identifier (e.g., "OPEN_METEO", "WEATHERAPI")

pub mod consensus;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod retry;

// Re-export all public types from models
pub use models::{dew_point, Coordinates, ProviderId, WeatherCondition, WeatherSample};

// Re-export consensus types
pub use consensus::{
    ConditionVote, ConsensusAggregator, ConsensusField, ConsensusWeather, WeatherField,
};

// Re-export provider types
pub use provider::open_meteo::OpenMeteoProvider;
pub use provider::openweathermap::OpenWeatherMapProvider;
pub use provider::weatherapi::WeatherApiProvider;
pub use provider::{RateLimit, WeatherProvider};

// Re-export registry types
pub use registry::{
    ProviderOutcome, ProviderRegistry, Quota, RateLimitConfig, RateLimiter, SampleValidator,
};

// Re-export error types
pub use errors::{RetryClass, WeatherDataError};

// Re-export the executor
pub use retry::{execute, AttemptError, Backoff, ExecutionError, RetryPolicy};
