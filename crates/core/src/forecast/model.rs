use serde::{Deserialize, Serialize};

use routecast_weather_data::{ConsensusWeather, ProviderId, WeatherDataError, WeatherSample};

use crate::alerts::Alert;
use crate::routes::{Route, RoutePoint};
use crate::settings::{ForecastPreferences, ForecastSettings};

/// How completely a point was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForecastStatus {
    /// Every dispatched provider answered
    Ok,
    /// Some providers failed; data comes from the rest
    Degraded,
    /// No provider produced data
    Failed,
}

/// Coarse classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Auth,
    RateLimited,
    QuotaExceeded,
    Upstream,
    Timeout,
    Parse,
    Other,
}

impl FailureKind {
    /// Whether the same request could succeed shortly after.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream | Self::Timeout)
    }
}

/// One provider's failure at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFailure {
    pub provider_id: ProviderId,
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(provider_id: ProviderId, error: &WeatherDataError) -> Self {
        let kind = match error {
            WeatherDataError::Auth { .. } => FailureKind::Auth,
            WeatherDataError::RateLimited { .. } => FailureKind::RateLimited,
            WeatherDataError::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            WeatherDataError::Upstream { .. } => FailureKind::Upstream,
            WeatherDataError::Timeout { .. } => FailureKind::Timeout,
            WeatherDataError::Parse { .. } => FailureKind::Parse,
            WeatherDataError::Consensus(_)
            | WeatherDataError::NoProvidersAvailable
            | WeatherDataError::Configuration(_) => FailureKind::Other,
        };
        Self {
            provider_id,
            kind,
            message: error.to_string(),
        }
    }
}

/// Forecast for one sampled route point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub route_point: RoutePoint,
    pub status: ForecastStatus,
    /// Reading of the highest-priority provider that answered
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub primary_sample: Option<WeatherSample>,
    pub all_samples: Vec<WeatherSample>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consensus: Option<ConsensusWeather>,
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub provider_errors: Vec<ProviderFailure>,
    /// Estimated arrival rendered in the requested timezone (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub local_time: Option<String>,
}

impl WeatherForecast {
    pub fn is_failed(&self) -> bool {
        self.status == ForecastStatus::Failed
    }
}

/// A forecast request as received from the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub route: Route,
    pub settings: ForecastSettings,
    #[serde(default)]
    pub preferences: ForecastPreferences,
}

impl ForecastRequest {
    pub fn new(route: Route, settings: ForecastSettings) -> Self {
        Self {
            route,
            settings,
            preferences: ForecastPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: ForecastPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub forecasts: Vec<WeatherForecast>,
    pub cache_hit: bool,
    /// The job was cancelled; `forecasts` holds the completed chunks
    pub cancelled: bool,
    /// Points whose status is `Failed`
    pub failed_points: usize,
    /// Sample points on the route, including any not delivered
    pub total_points: usize,
    /// Why a progressive job stopped before the end of the route
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<String>,
}

impl ForecastResponse {
    pub(crate) fn new(forecasts: Vec<WeatherForecast>, total_points: usize) -> Self {
        let failed_points = forecasts.iter().filter(|f| f.is_failed()).count();
        Self {
            forecasts,
            cache_hit: false,
            cancelled: false,
            failed_points,
            total_points,
            failure: None,
        }
    }

    /// Every sample point was delivered and none failed.
    pub fn is_complete(&self) -> bool {
        !self.cancelled
            && self.failure.is_none()
            && self.failed_points == 0
            && self.forecasts.len() == self.total_points
    }
}
