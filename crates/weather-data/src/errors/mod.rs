//! Error types and retry classification for the weather data crate.
//!
//! This module provides:
//! - [`WeatherDataError`]: The main error enum for all provider operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while acquiring weather data.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which the retry executor's
/// default predicate uses to decide whether to try again.
#[derive(Error, Debug, Clone)]
pub enum WeatherDataError {
    /// The provider rejected our credentials (HTTP 401/403).
    /// Never retried.
    #[error("Authentication failed: {provider}")]
    Auth {
        /// The provider that rejected the request
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// Our own per-provider quota is spent. No network call was made.
    #[error("Quota exhausted for {provider} until {reset_at}")]
    QuotaExceeded {
        /// The provider whose quota is spent
        provider: String,
        /// When the exhausted window rolls over
        reset_at: DateTime<Utc>,
    },

    /// The provider failed on its side (5xx) or the network failed.
    #[error("Upstream error: {provider} - {message}")]
    Upstream {
        /// The provider that failed
        provider: String,
        /// Error detail
        message: String,
        /// HTTP status, when one was received
        status: Option<u16>,
    },

    /// The request exceeded its deadline.
    #[error("Timeout after {timeout:?}: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
        /// The deadline that was exceeded
        timeout: Duration,
    },

    /// The provider answered but the payload could not be understood.
    #[error("Parse error: {provider} - {message}")]
    Parse {
        /// The provider that returned the payload
        provider: String,
        /// What went wrong
        message: String,
    },

    /// No provider produced data for a point.
    #[error("Consensus failed: {0}")]
    Consensus(String),

    /// No provider is enabled for the request.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// Provider misconfiguration (missing key, bad base URL).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WeatherDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use routecast_weather_data::errors::{RetryClass, WeatherDataError};
    ///
    /// let error = WeatherDataError::Upstream {
    ///     provider: "OPEN_METEO".to_string(),
    ///     message: "502 Bad Gateway".to_string(),
    ///     status: Some(502),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::Retryable);
    ///
    /// let error = WeatherDataError::Auth { provider: "WEATHERAPI".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Upstream { .. } | Self::Timeout { .. } => RetryClass::Retryable,

            Self::RateLimited { .. } => RetryClass::RetryableIfAllowed,

            Self::Auth { .. }
            | Self::QuotaExceeded { .. }
            | Self::Parse { .. }
            | Self::Consensus(_)
            | Self::NoProvidersAvailable
            | Self::Configuration(_) => RetryClass::Never,
        }
    }

    /// The provider this error is attributed to, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Auth { provider }
            | Self::RateLimited { provider }
            | Self::QuotaExceeded { provider, .. }
            | Self::Upstream { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Parse { provider, .. } => Some(provider),
            Self::Consensus(_) | Self::NoProvidersAvailable | Self::Configuration(_) => None,
        }
    }

    /// True for either flavour of rate limiting (remote 429 or local quota).
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::QuotaExceeded { .. })
    }
}
