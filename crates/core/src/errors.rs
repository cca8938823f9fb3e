//! Core error types for the Routecast forecast pipeline.
//!
//! Provider-level failures arrive as [`WeatherDataError`] and are either
//! recorded per point (one provider down, one point unfetchable) or surfaced
//! through [`Error::WeatherData`] when they fail the request as a whole.

use chrono::{DateTime, Utc};
use thiserror::Error;

use routecast_weather_data::{RetryClass, WeatherDataError};

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for forecast requests.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Bad route or settings. Fails the request immediately.
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A client exceeded its inbound quota.
    #[error("Rate limit exceeded for {key}; resets at {reset_at}")]
    RateLimit {
        key: String,
        reset_at: DateTime<Utc>,
    },

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// No provider produced data for a point.
    #[error("Consensus failed: {0}")]
    Consensus(String),

    /// Cache backend failure. Callers log it and treat the lookup as a miss.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Every point of the route failed.
    #[error("All providers failed for all {points} point(s)")]
    AllProvidersFailed { points: usize },

    #[error("Invalid configuration value: {0}")]
    Configuration(String),

    #[error("Weather data operation failed: {0}")]
    WeatherData(#[from] WeatherDataError),
}

impl Error {
    /// Whether repeating the operation could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(_) | Self::Timeout(_) => true,
            Self::WeatherData(e) => e.retry_class() == RetryClass::Retryable,
            Self::Validation(_)
            | Self::RateLimit { .. }
            | Self::Consensus(_)
            | Self::Cache(_)
            | Self::AllProvidersFailed { .. }
            | Self::Configuration(_) => false,
        }
    }
}

/// Validation errors for routes and settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Route must contain at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("Invalid coordinates at point {index}: ({lat}, {lon})")]
    InvalidCoordinates { index: usize, lat: f64, lon: f64 },

    #[error("Interval {value} km outside [{min}, {max}]")]
    IntervalOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Average speed {0} km/h outside (0, 120]")]
    SpeedOutOfRange(f64),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Cache(err.to_string())
    }
}
