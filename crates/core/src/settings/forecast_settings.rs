use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::defaults::{
    DEFAULT_AVERAGE_SPEED_KMH, DEFAULT_INTERVAL_KM, DEFAULT_TIMEZONE, DEFAULT_UNITS,
};
use crate::constants::{MAX_AVERAGE_SPEED_KMH, MAX_INTERVAL_KM, MIN_INTERVAL_KM};
use crate::errors::ValidationError;

/// Presentation units for forecast values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// °C, m/s, mm
    #[default]
    Metric,
    /// °F, mph, in
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

/// Everything that shapes sampling and presentation of a forecast.
///
/// Built explicitly: `ForecastSettings::new(start)` followed by `with_*`
/// calls. Unset fields take the values in [`defaults`](super::defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSettings {
    pub start_time: DateTime<Utc>,
    pub average_speed_kmh: f64,
    pub interval_km: f64,
    pub units: Units,
    pub timezone: String,
}

impl ForecastSettings {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            interval_km: DEFAULT_INTERVAL_KM,
            units: DEFAULT_UNITS,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    pub fn with_average_speed_kmh(mut self, speed: f64) -> Self {
        self.average_speed_kmh = speed;
        self
    }

    pub fn with_interval_km(mut self, interval: f64) -> Self {
        self.interval_km = interval;
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.average_speed_kmh > 0.0 && self.average_speed_kmh <= MAX_AVERAGE_SPEED_KMH) {
            return Err(ValidationError::SpeedOutOfRange(self.average_speed_kmh));
        }
        if !(MIN_INTERVAL_KM..=MAX_INTERVAL_KM).contains(&self.interval_km) {
            return Err(ValidationError::IntervalOutOfRange {
                value: self.interval_km,
                min: MIN_INTERVAL_KM,
                max: MAX_INTERVAL_KM,
            });
        }
        self.tz()?;
        Ok(())
    }

    /// The configured IANA timezone.
    pub fn tz(&self) -> Result<Tz, ValidationError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ValidationError::UnknownTimezone(self.timezone.clone()))
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
