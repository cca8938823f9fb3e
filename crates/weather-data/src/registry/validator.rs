//! Weather sample validation.
//!
//! Rejects readings no real atmosphere produces before they reach consensus:
//! - Non-finite numbers
//! - Humidity and cloud cover outside 0..=100 %
//! - Negative wind speed or precipitation
//! - Temperatures and pressures outside recorded extremes

use log::warn;

use crate::errors::WeatherDataError;
use crate::models::WeatherSample;

/// Coldest and hottest surface air temperatures ever recorded, padded.
const TEMP_RANGE_C: (f64, f64) = (-95.0, 65.0);

/// Sea-level pressure envelope (hPa), padded.
const PRESSURE_RANGE_HPA: (f64, f64) = (850.0, 1100.0);

/// Anything faster is a unit bug (km/h or mph reported as m/s).
const MAX_WIND_SPEED_MS: f64 = 120.0;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - reject the sample.
    Hard,
    /// Soft warning - accept the sample but log a warning.
    Soft,
}

/// A single finding against a sample.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub severity: ValidationSeverity,
    pub message: String,
}

/// Sanity checks for provider samples.
#[derive(Clone, Debug, Default)]
pub struct SampleValidator;

impl SampleValidator {
    pub fn new() -> Self {
        Self
    }

    /// Collect every issue with the sample.
    pub fn check(&self, sample: &WeatherSample) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let numbers = [
            ("temp", sample.temp),
            ("feelsLike", sample.feels_like),
            ("humidity", sample.humidity),
            ("pressure", sample.pressure),
            ("windSpeed", sample.wind_speed),
            ("windDeg", sample.wind_deg),
            ("cloudCover", sample.cloud_cover),
            ("precipitation1h", sample.precipitation_1h),
            ("dewPoint", sample.dew_point),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                issues.push(hard(field, format!("{} is not a finite number", field)));
            }
        }

        if !(TEMP_RANGE_C.0..=TEMP_RANGE_C.1).contains(&sample.temp) {
            issues.push(hard("temp", format!("temperature {} °C out of range", sample.temp)));
        }
        if !(0.0..=100.0).contains(&sample.humidity) {
            issues.push(hard("humidity", format!("humidity {} % out of range", sample.humidity)));
        }
        if !(0.0..=100.0).contains(&sample.cloud_cover) {
            issues.push(hard(
                "cloudCover",
                format!("cloud cover {} % out of range", sample.cloud_cover),
            ));
        }
        if sample.wind_speed < 0.0 || sample.wind_speed > MAX_WIND_SPEED_MS {
            issues.push(hard(
                "windSpeed",
                format!("wind speed {} m/s out of range", sample.wind_speed),
            ));
        }
        if sample.precipitation_1h < 0.0 {
            issues.push(hard(
                "precipitation1h",
                format!("negative precipitation {}", sample.precipitation_1h),
            ));
        }
        if !(PRESSURE_RANGE_HPA.0..=PRESSURE_RANGE_HPA.1).contains(&sample.pressure) {
            // Station pressure at altitude can legitimately fall below sea-level norms
            issues.push(ValidationIssue {
                field: "pressure",
                severity: ValidationSeverity::Soft,
                message: format!("pressure {} hPa outside sea-level envelope", sample.pressure),
            });
        }
        if sample.dew_point > sample.temp + 0.5 {
            issues.push(ValidationIssue {
                field: "dewPoint",
                severity: ValidationSeverity::Soft,
                message: format!(
                    "dew point {} above temperature {}",
                    sample.dew_point, sample.temp
                ),
            });
        }

        issues
    }

    /// Validate a sample, failing on the first hard issue.
    pub fn validate(&self, sample: &WeatherSample) -> Result<(), WeatherDataError> {
        for issue in self.check(sample) {
            match issue.severity {
                ValidationSeverity::Hard => {
                    return Err(WeatherDataError::Parse {
                        provider: sample.provider_id.to_string(),
                        message: issue.message,
                    });
                }
                ValidationSeverity::Soft => {
                    warn!(
                        "Sample from '{}' has a suspicious {}: {}",
                        sample.provider_id, issue.field, issue.message
                    );
                }
            }
        }
        Ok(())
    }
}

fn hard(field: &'static str, message: String) -> ValidationIssue {
    ValidationIssue {
        field,
        severity: ValidationSeverity::Hard,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherSample {
        WeatherSample::new("TEST", 18.0, 65.0)
    }

    #[test]
    fn test_plausible_sample_passes() {
        assert!(SampleValidator::new().validate(&sample()).is_ok());
    }

    #[test]
    fn test_humidity_out_of_range_is_rejected() {
        let mut s = sample();
        s.humidity = 140.0;
        let err = SampleValidator::new().validate(&s).unwrap_err();
        assert!(matches!(err, WeatherDataError::Parse { .. }));
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut s = sample();
        s.wind_speed = f64::NAN;
        assert!(SampleValidator::new().validate(&s).is_err());
    }

    #[test]
    fn test_kmh_wind_reported_as_ms_is_rejected() {
        let mut s = sample();
        s.wind_speed = 150.0;
        assert!(SampleValidator::new().validate(&s).is_err());
    }

    #[test]
    fn test_low_station_pressure_is_only_a_warning() {
        let mut s = sample();
        s.pressure = 780.0;
        let issues = SampleValidator::new().check(&s);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ValidationSeverity::Soft);
        assert!(SampleValidator::new().validate(&s).is_ok());
    }
}
