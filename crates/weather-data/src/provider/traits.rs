//! Weather provider trait definitions.
//!
//! This module defines the core `WeatherProvider` trait that all
//! weather providers must implement.

use async_trait::async_trait;

use crate::errors::WeatherDataError;
use crate::models::{Coordinates, WeatherSample};

use super::capabilities::RateLimit;

/// Trait for weather providers.
///
/// Implement this trait to add support for a new weather source. An
/// implementation performs exactly one network call per `fetch_current` and
/// normalizes the response into a [`WeatherSample`]. Rate limiting, retries
/// and timeouts are applied around it by the
/// [`ProviderRegistry`](crate::registry::ProviderRegistry), never inside it.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use routecast_weather_data::provider::{RateLimit, WeatherProvider};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl WeatherProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     // ... implement fetch_current
/// }
/// ```
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "OPEN_METEO", "WEATHERAPI", etc.
    /// Used for logging, rate limiting and sample attribution.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering.
    ///
    /// Lower values = higher priority. Default is 10. The registry picks the
    /// highest-priority provider in single-source mode, and consensus breaks
    /// condition ties in this order.
    fn priority(&self) -> u8 {
        10
    }

    /// Quota this provider is subject to.
    fn rate_limit(&self) -> RateLimit;

    /// Fetch current conditions at a position.
    ///
    /// # Errors
    ///
    /// - [`WeatherDataError::Auth`] on HTTP 401/403
    /// - [`WeatherDataError::RateLimited`] on HTTP 429
    /// - [`WeatherDataError::Upstream`] on 5xx or network failure
    /// - [`WeatherDataError::Timeout`] when the HTTP client times out
    /// - [`WeatherDataError::Parse`] when the body cannot be understood
    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSample, WeatherDataError>;
}
