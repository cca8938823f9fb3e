//! Fixed-interval sampling along a route.
//!
//! Samples are taken at `0, i, 2i, ...` km below the route length, followed by
//! the final point, so the start and the end are always present even when the
//! length is not a multiple of the interval. A multiple within
//! [`END_TOLERANCE_KM`] of the end is folded into the final point. Positions
//! between original points are interpolated linearly.

use chrono::Duration as ChronoDuration;

use super::geo::lerp;
use super::model::RoutePoint;
use crate::constants::{MAX_INTERVAL_KM, MIN_INTERVAL_KM};
use crate::errors::{Result, ValidationError};
use crate::settings::ForecastSettings;

/// Interval multiples this close to the route end are treated as the end.
pub const END_TOLERANCE_KM: f64 = 1e-3;

/// Number of interval multiples sampled before the final point.
fn regular_sample_count(total_km: f64, interval_km: f64) -> usize {
    if !total_km.is_finite() || total_km <= 0.0 {
        return 0;
    }
    let limit = total_km - END_TOLERANCE_KM;
    let mut n = (limit / interval_km).ceil().max(1.0) as usize;
    // Correct float rounding in either direction; the start is always kept
    while n > 1 && (n - 1) as f64 * interval_km >= limit {
        n -= 1;
    }
    while (n as f64) * interval_km < limit {
        n += 1;
    }
    n
}

/// Number of points [`RouteSampler::sample`] yields for a route of this length.
pub fn estimate_sample_count(total_km: f64, interval_km: f64) -> usize {
    regular_sample_count(total_km, interval_km) + 1
}

/// Samples route points at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct RouteSampler {
    interval_km: f64,
}

impl RouteSampler {
    /// # Errors
    ///
    /// [`ValidationError::IntervalOutOfRange`] outside
    /// `[MIN_INTERVAL_KM, MAX_INTERVAL_KM]` or for NaN.
    pub fn new(interval_km: f64) -> Result<Self> {
        if !(MIN_INTERVAL_KM..=MAX_INTERVAL_KM).contains(&interval_km) {
            return Err(ValidationError::IntervalOutOfRange {
                value: interval_km,
                min: MIN_INTERVAL_KM,
                max: MAX_INTERVAL_KM,
            }
            .into());
        }
        Ok(Self { interval_km })
    }

    pub fn interval_km(&self) -> f64 {
        self.interval_km
    }

    /// Sample `points`, which must carry non-decreasing cumulative distances.
    pub fn sample(&self, points: &[RoutePoint]) -> Result<Vec<RoutePoint>> {
        if points.len() < 2 {
            return Err(ValidationError::TooFewPoints(points.len()).into());
        }
        if points.iter().any(|p| !p.distance_km.is_finite()) {
            return Err(ValidationError::InvalidInput(
                "route distances must be finite".to_string(),
            )
            .into());
        }
        if points
            .windows(2)
            .any(|w| w[1].distance_km < w[0].distance_km)
        {
            return Err(ValidationError::InvalidInput(
                "route distances must be non-decreasing".to_string(),
            )
            .into());
        }

        let first = points[0];
        let last = points[points.len() - 1];
        let length = last.distance_km - first.distance_km;

        let regular = regular_sample_count(length, self.interval_km);
        let mut samples = Vec::with_capacity(regular + 1);
        let mut segment = 0;

        for k in 0..regular {
            let target = first.distance_km + k as f64 * self.interval_km;
            while segment + 2 < points.len() && points[segment + 1].distance_km < target {
                segment += 1;
            }
            samples.push(interpolate(&points[segment], &points[segment + 1], target));
        }

        samples.push(RoutePoint {
            estimated_time: None,
            ..last
        });

        Ok(samples)
    }

    /// Sample and stamp each point with its expected arrival time.
    pub fn sample_with_schedule(
        &self,
        points: &[RoutePoint],
        settings: &ForecastSettings,
    ) -> Result<Vec<RoutePoint>> {
        let mut samples = self.sample(points)?;
        let origin = points[0].distance_km;

        for point in &mut samples {
            let hours = (point.distance_km - origin) / settings.average_speed_kmh;
            let offset = ChronoDuration::milliseconds((hours * 3_600_000.0).round() as i64);
            point.estimated_time = Some(settings.start_time + offset);
        }

        Ok(samples)
    }
}

fn interpolate(a: &RoutePoint, b: &RoutePoint, distance_km: f64) -> RoutePoint {
    let span = b.distance_km - a.distance_km;
    let t = if span > 0.0 {
        ((distance_km - a.distance_km) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let elevation = match (a.elevation, b.elevation) {
        (Some(ea), Some(eb)) => Some(lerp(ea, eb, t)),
        (Some(e), None) | (None, Some(e)) => Some(e),
        (None, None) => None,
    };

    RoutePoint {
        lat: lerp(a.lat, b.lat, t),
        lon: lerp(a.lon, b.lon, t),
        distance_km,
        elevation,
        estimated_time: None,
    }
}
