//! Shared HTTP plumbing for provider adapters.
//!
//! Maps transport failures and status codes onto [`WeatherDataError`] the same
//! way for every provider:
//! - 401/403 → `Auth`
//! - 429 → `RateLimited`
//! - 5xx and connection failures → `Upstream`
//! - client timeouts → `Timeout`
//! - other non-success statuses → `Upstream` with the status attached
//! - undecodable bodies → `Parse`

use std::time::Duration;

use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::errors::WeatherDataError;

/// Default HTTP request timeout. The retry executor applies its own,
/// usually tighter, deadline on top.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("routecast/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by the adapters.
pub fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send `request` and decode a JSON body, classifying every failure.
pub async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, WeatherDataError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            WeatherDataError::Timeout {
                provider: provider.to_string(),
                timeout: REQUEST_TIMEOUT,
            }
        } else {
            WeatherDataError::Upstream {
                provider: provider.to_string(),
                message: format!("Request failed: {}", e),
                status: None,
            }
        }
    })?;

    let status = response.status();
    debug!("{} responded with {}", provider, status);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(WeatherDataError::Auth {
            provider: provider.to_string(),
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(WeatherDataError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WeatherDataError::Upstream {
            provider: provider.to_string(),
            message: format!("HTTP {} - {}", status, truncate(&body, 200)),
            status: Some(status.as_u16()),
        });
    }

    let body = response.text().await.map_err(|e| WeatherDataError::Upstream {
        provider: provider.to_string(),
        message: format!("Failed to read response: {}", e),
        status: Some(status.as_u16()),
    })?;

    serde_json::from_str(&body).map_err(|e| WeatherDataError::Parse {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
