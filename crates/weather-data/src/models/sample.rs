use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::WeatherCondition;
use super::types::ProviderId;

/// Magnus coefficient `a` (dimensionless).
pub const MAGNUS_A: f64 = 17.27;

/// Magnus coefficient `b` in °C.
pub const MAGNUS_B: f64 = 237.7;

/// Dew point in °C from air temperature (°C) and relative humidity (%).
///
/// Uses the Magnus formula `dewPoint = (b·α)/(a−α)` with
/// `α = ln(RH/100) + (a·T)/(b+T)`. Humidity is clamped to `[1, 100]` so that a
/// reading of 0 % does not produce `-inf`.
pub fn dew_point(temp_c: f64, relative_humidity: f64) -> f64 {
    let rh = relative_humidity.clamp(1.0, 100.0);
    let alpha = (rh / 100.0).ln() + (MAGNUS_A * temp_c) / (MAGNUS_B + temp_c);
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

/// Canonical per-point weather reading from one provider.
///
/// All values are metric: °C, %, hPa, m/s, degrees, mm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    /// Provider that produced the reading
    pub provider_id: ProviderId,

    /// Air temperature (°C)
    pub temp: f64,

    /// Apparent temperature (°C)
    pub feels_like: f64,

    /// Relative humidity (%)
    pub humidity: f64,

    /// Sea-level pressure (hPa)
    pub pressure: f64,

    /// Wind speed (m/s)
    pub wind_speed: f64,

    /// Wind direction (degrees, meteorological)
    pub wind_deg: f64,

    /// Cloud cover (%)
    pub cloud_cover: f64,

    /// Precipitation over the last hour (mm)
    #[serde(rename = "precipitation1h")]
    pub precipitation_1h: f64,

    /// Dew point (°C). Reported by the provider or derived via Magnus.
    pub dew_point: f64,

    /// Condition in the shared taxonomy
    pub condition_code: WeatherCondition,

    /// When the sample was fetched
    pub fetched_at: DateTime<Utc>,

    /// Provider-reported confidence (0..1), when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl WeatherSample {
    /// Create a sample from the core readings, deriving the dew point.
    ///
    /// `feels_like` defaults to `temp` and the remaining fields to zero/clear;
    /// adapters overwrite what their provider reports.
    pub fn new(provider_id: impl Into<ProviderId>, temp: f64, humidity: f64) -> Self {
        Self {
            provider_id: provider_id.into(),
            temp,
            feels_like: temp,
            humidity,
            pressure: 1013.25,
            wind_speed: 0.0,
            wind_deg: 0.0,
            cloud_cover: 0.0,
            precipitation_1h: 0.0,
            dew_point: dew_point(temp, humidity),
            condition_code: WeatherCondition::Clear,
            fetched_at: Utc::now(),
            confidence: None,
        }
    }

    /// Replace the derived dew point with a provider-reported value, if any.
    pub fn with_reported_dew_point(mut self, reported: Option<f64>) -> Self {
        if let Some(value) = reported {
            self.dew_point = value;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dew_point_reference_value() {
        // 20°C at 60% RH is the textbook ~12°C case
        let dp = dew_point(20.0, 60.0);
        assert!((dp - 12.0).abs() < 0.5, "dew point was {dp}");
    }

    #[test]
    fn test_dew_point_saturated_air_equals_temperature() {
        let dp = dew_point(15.0, 100.0);
        assert!((dp - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_dew_point_zero_humidity_is_finite() {
        assert!(dew_point(25.0, 0.0).is_finite());
    }

    #[test]
    fn test_new_sample_derives_dew_point() {
        let sample = WeatherSample::new("OPEN_METEO", 20.0, 60.0);
        assert!((sample.dew_point - dew_point(20.0, 60.0)).abs() < 1e-12);
        assert_eq!(sample.feels_like, 20.0);

        let reported = sample.with_reported_dew_point(Some(11.4));
        assert_eq!(reported.dew_point, 11.4);
    }

    #[test]
    fn test_sample_serializes_camel_case() {
        let sample = WeatherSample::new("OPEN_METEO", 10.0, 50.0);
        let json = serde_json::to_value(&sample).unwrap();
        assert!(json.get("feelsLike").is_some());
        assert!(json.get("precipitation1h").is_some());
        assert!(json.get("conditionCode").is_some());
        assert!(json.get("confidence").is_none());
    }
}
