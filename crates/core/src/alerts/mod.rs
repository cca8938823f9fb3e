//! Threshold alerts for a forecast point.
//!
//! Thresholds are configuration ([`AlertThresholds`]); evaluation always runs
//! on metric values, before any unit conversion.

use serde::{Deserialize, Serialize};

use routecast_weather_data::{ConsensusWeather, WeatherCondition, WeatherField, WeatherSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    HighWind,
    HighTemperature,
    LowTemperature,
    Precipitation,
    Thunderstorm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertSeverity {
    Advisory,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    /// Observed value (metric)
    pub value: f64,
    /// Threshold that was crossed (metric)
    pub threshold: f64,
}

/// Alert thresholds in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThresholds {
    /// Wind speed above this raises `HighWind` (m/s)
    pub wind_speed_ms: f64,
    /// Temperature above this raises `HighTemperature` (°C)
    pub high_temp_c: f64,
    /// Temperature below this raises `LowTemperature` (°C)
    pub low_temp_c: f64,
    /// Precipitation above this raises `Precipitation` (mm/h)
    pub precipitation_mm: f64,
    pub thunderstorm: bool,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            wind_speed_ms: 10.0,
            high_temp_c: 35.0,
            low_temp_c: 0.0,
            precipitation_mm: 0.0,
            thunderstorm: true,
        }
    }
}

/// The values alerts are evaluated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertInputs {
    pub temp: f64,
    pub wind_speed: f64,
    pub precipitation_1h: f64,
    pub condition: WeatherCondition,
}

impl AlertInputs {
    pub fn from_sample(sample: &WeatherSample) -> Self {
        Self {
            temp: sample.temp,
            wind_speed: sample.wind_speed,
            precipitation_1h: sample.precipitation_1h,
            condition: sample.condition_code,
        }
    }

    /// Consensus values, falling back to `fallback` for missing fields.
    pub fn from_consensus(consensus: &ConsensusWeather, fallback: &WeatherSample) -> Self {
        Self {
            temp: consensus.value(WeatherField::Temp).unwrap_or(fallback.temp),
            wind_speed: consensus
                .value(WeatherField::WindSpeed)
                .unwrap_or(fallback.wind_speed),
            precipitation_1h: consensus
                .value(WeatherField::Precipitation1h)
                .unwrap_or(fallback.precipitation_1h),
            condition: consensus.condition.value,
        }
    }
}

impl AlertThresholds {
    pub fn evaluate(&self, inputs: &AlertInputs) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if inputs.wind_speed > self.wind_speed_ms {
            alerts.push(Alert {
                kind: AlertKind::HighWind,
                severity: if inputs.wind_speed > self.wind_speed_ms * 1.5 {
                    AlertSeverity::Warning
                } else {
                    AlertSeverity::Advisory
                },
                message: format!("Wind {:.1} m/s", inputs.wind_speed),
                value: inputs.wind_speed,
                threshold: self.wind_speed_ms,
            });
        }

        if inputs.temp > self.high_temp_c {
            alerts.push(Alert {
                kind: AlertKind::HighTemperature,
                severity: AlertSeverity::Warning,
                message: format!("Temperature {:.1} °C", inputs.temp),
                value: inputs.temp,
                threshold: self.high_temp_c,
            });
        } else if inputs.temp < self.low_temp_c {
            alerts.push(Alert {
                kind: AlertKind::LowTemperature,
                severity: AlertSeverity::Advisory,
                message: format!("Temperature {:.1} °C, possible ice", inputs.temp),
                value: inputs.temp,
                threshold: self.low_temp_c,
            });
        }

        if inputs.precipitation_1h > self.precipitation_mm {
            alerts.push(Alert {
                kind: AlertKind::Precipitation,
                severity: AlertSeverity::Advisory,
                message: format!("Precipitation {:.1} mm/h", inputs.precipitation_1h),
                value: inputs.precipitation_1h,
                threshold: self.precipitation_mm,
            });
        }

        if self.thunderstorm && inputs.condition == WeatherCondition::Thunderstorm {
            alerts.push(Alert {
                kind: AlertKind::Thunderstorm,
                severity: AlertSeverity::Warning,
                message: "Thunderstorm expected".to_string(),
                value: 1.0,
                threshold: 1.0,
            });
        }

        alerts
    }
}
