//! Presentation units.
//!
//! Forecasts are computed and alerted on in metric. Imperial requests are
//! converted at the very end; pressure stays in hPa and alert values stay
//! metric.

use routecast_weather_data::{ConsensusWeather, WeatherField, WeatherSample};

use super::model::WeatherForecast;
use crate::settings::Units;

const MS_TO_MPH: f64 = 2.236_936_292_054_402;
const MM_TO_IN: f64 = 1.0 / 25.4;
const C_TO_F_SCALE: f64 = 1.8;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * C_TO_F_SCALE + 32.0
}

pub fn ms_to_mph(ms: f64) -> f64 {
    ms * MS_TO_MPH
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm * MM_TO_IN
}

/// Linear conversion `x * scale + offset` for a field, if it has one.
fn conversion(field: WeatherField) -> Option<(f64, f64)> {
    match field {
        WeatherField::Temp | WeatherField::FeelsLike | WeatherField::DewPoint => {
            Some((C_TO_F_SCALE, 32.0))
        }
        WeatherField::WindSpeed => Some((MS_TO_MPH, 0.0)),
        WeatherField::Precipitation1h => Some((MM_TO_IN, 0.0)),
        WeatherField::Humidity
        | WeatherField::Pressure
        | WeatherField::WindDeg
        | WeatherField::CloudCover => None,
    }
}

fn convert_sample(sample: &mut WeatherSample) {
    sample.temp = celsius_to_fahrenheit(sample.temp);
    sample.feels_like = celsius_to_fahrenheit(sample.feels_like);
    sample.dew_point = celsius_to_fahrenheit(sample.dew_point);
    sample.wind_speed = ms_to_mph(sample.wind_speed);
    sample.precipitation_1h = mm_to_inches(sample.precipitation_1h);
}

fn convert_consensus(consensus: &mut ConsensusWeather) {
    for (field, merged) in consensus.fields.iter_mut() {
        if let Some((scale, offset)) = conversion(*field) {
            merged.value = merged.value * scale + offset;
            // Variance scales with the square of a linear map; offsets drop out
            merged.variance *= scale * scale;
        }
    }
}

/// Convert a metric forecast in place.
pub fn apply_units(forecast: &mut WeatherForecast, units: Units) {
    if units == Units::Metric {
        return;
    }
    if let Some(sample) = forecast.primary_sample.as_mut() {
        convert_sample(sample);
    }
    forecast.all_samples.iter_mut().for_each(convert_sample);
    if let Some(consensus) = forecast.consensus.as_mut() {
        convert_consensus(consensus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastStatus;
    use crate::routes::RoutePoint;
    use routecast_weather_data::ConsensusAggregator;

    fn forecast() -> WeatherForecast {
        let mut a = WeatherSample::new("A", 20.0, 50.0);
        a.wind_speed = 10.0;
        a.precipitation_1h = 25.4;
        let mut b = a.clone();
        b.provider_id = "B".into();
        b.temp = 22.0;

        let consensus = ConsensusAggregator::new(vec!["A".into(), "B".into()])
            .aggregate(&[a.clone(), b.clone()])
            .unwrap();

        WeatherForecast {
            route_point: RoutePoint::new(45.0, 7.0, 0.0),
            status: ForecastStatus::Ok,
            primary_sample: Some(a.clone()),
            all_samples: vec![a, b],
            consensus: Some(consensus),
            alerts: vec![],
            provider_errors: vec![],
            local_time: None,
        }
    }

    #[test]
    fn test_metric_is_untouched() {
        let mut f = forecast();
        let before = f.clone();
        apply_units(&mut f, Units::Metric);
        assert_eq!(f, before);
    }

    #[test]
    fn test_imperial_conversion() {
        let mut f = forecast();
        let pressure = f.all_samples[0].pressure;
        apply_units(&mut f, Units::Imperial);

        let primary = f.primary_sample.as_ref().unwrap();
        assert!((primary.temp - 68.0).abs() < 1e-9);
        assert!((primary.wind_speed - 22.369).abs() < 1e-3);
        assert!((primary.precipitation_1h - 1.0).abs() < 1e-9);
        assert_eq!(primary.pressure, pressure);
        assert!((f.all_samples[1].temp - 71.6).abs() < 1e-9);

        let temp = f.consensus.as_ref().unwrap().field(WeatherField::Temp).unwrap();
        assert!((temp.value - 69.8).abs() < 1e-9);
        // 1 °C² → 3.24 °F²
        assert!((temp.variance - 3.24).abs() < 1e-9);
    }
}
