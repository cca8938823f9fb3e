//! Numeric weather fields and their fixed consensus constants.
//!
//! | Field | Reference scale | Outlier noise floor |
//! |-------|-----------------|---------------------|
//! | temp | 25 °C² | 1.0 °C |
//! | feelsLike | - | 1.0 °C |
//! | humidity | 400 %² | 5 % |
//! | pressure | 25 hPa² | 1.0 hPa |
//! | windSpeed | 9 (m/s)² | 0.5 m/s |
//! | windDeg | - | - |
//! | cloudCover | - | 10 % |
//! | precipitation1h | 4 mm² | 0.5 mm |
//! | dewPoint | - | 1.0 °C |
//!
//! A reference scale is the variance at which a field's agreement drops to
//! zero. Fields without one are merged but do not contribute to the overall
//! agreement score.

use serde::{Deserialize, Serialize};

use crate::models::WeatherSample;

pub const TEMP_REFERENCE_SCALE: f64 = 25.0;
pub const HUMIDITY_REFERENCE_SCALE: f64 = 400.0;
pub const PRESSURE_REFERENCE_SCALE: f64 = 25.0;
pub const WIND_SPEED_REFERENCE_SCALE: f64 = 9.0;
pub const PRECIPITATION_REFERENCE_SCALE: f64 = 4.0;

/// Number of standard deviations beyond which a source is an outlier.
pub const OUTLIER_SIGMA: f64 = 2.0;

/// Minimum number of sources before outliers are looked for.
pub const MIN_SOURCES_FOR_OUTLIERS: usize = 3;

/// A numeric attribute of [`WeatherSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeatherField {
    Temp,
    FeelsLike,
    Humidity,
    Pressure,
    WindSpeed,
    WindDeg,
    CloudCover,
    #[serde(rename = "precipitation1h")]
    Precipitation1h,
    DewPoint,
}

impl WeatherField {
    pub const ALL: [WeatherField; 9] = [
        Self::Temp,
        Self::FeelsLike,
        Self::Humidity,
        Self::Pressure,
        Self::WindSpeed,
        Self::WindDeg,
        Self::CloudCover,
        Self::Precipitation1h,
        Self::DewPoint,
    ];

    /// Read this field from a sample.
    pub fn extract(&self, sample: &WeatherSample) -> f64 {
        match self {
            Self::Temp => sample.temp,
            Self::FeelsLike => sample.feels_like,
            Self::Humidity => sample.humidity,
            Self::Pressure => sample.pressure,
            Self::WindSpeed => sample.wind_speed,
            Self::WindDeg => sample.wind_deg,
            Self::CloudCover => sample.cloud_cover,
            Self::Precipitation1h => sample.precipitation_1h,
            Self::DewPoint => sample.dew_point,
        }
    }

    /// Variance at which agreement reaches zero, for scored fields.
    pub fn reference_scale(&self) -> Option<f64> {
        match self {
            Self::Temp => Some(TEMP_REFERENCE_SCALE),
            Self::Humidity => Some(HUMIDITY_REFERENCE_SCALE),
            Self::Pressure => Some(PRESSURE_REFERENCE_SCALE),
            Self::WindSpeed => Some(WIND_SPEED_REFERENCE_SCALE),
            Self::Precipitation1h => Some(PRECIPITATION_REFERENCE_SCALE),
            Self::FeelsLike | Self::WindDeg | Self::CloudCover | Self::DewPoint => None,
        }
    }

    /// Smallest standard deviation used when testing for outliers.
    ///
    /// Keeps near-identical readings from turning a trivial difference into
    /// an outlier. `None` excludes the field from outlier detection.
    pub fn noise_floor(&self) -> Option<f64> {
        match self {
            Self::Temp | Self::FeelsLike | Self::Pressure | Self::DewPoint => Some(1.0),
            Self::Humidity => Some(5.0),
            Self::WindSpeed | Self::Precipitation1h => Some(0.5),
            Self::CloudCover => Some(10.0),
            Self::WindDeg => None,
        }
    }

    /// Whether the field is an angle and must be averaged on the circle.
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::WindDeg)
    }

    /// Get the wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::FeelsLike => "feelsLike",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::WindSpeed => "windSpeed",
            Self::WindDeg => "windDeg",
            Self::CloudCover => "cloudCover",
            Self::Precipitation1h => "precipitation1h",
            Self::DewPoint => "dewPoint",
        }
    }
}

impl std::fmt::Display for WeatherField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
