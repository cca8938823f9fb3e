use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use routecast_weather_data::Coordinates;

use super::geo::haversine_km;
use crate::errors::{Result, ValidationError};

/// A track point as delivered by the GPX parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub elevation: Option<f64>,
}

impl RawPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }
}

/// A parsed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub name: String,
    pub points: Vec<RawPoint>,
    pub total_distance_km: f64,
}

impl Route {
    /// Build a route, computing its length from the points.
    pub fn new(name: impl Into<String>, points: Vec<RawPoint>) -> Self {
        let total_distance_km = points
            .windows(2)
            .map(|w| haversine_km(w[0].lat, w[0].lon, w[1].lat, w[1].lon))
            .sum();
        Self {
            name: name.into(),
            points,
            total_distance_km,
        }
    }

    /// Reject routes the pipeline cannot sample.
    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 2 {
            return Err(ValidationError::TooFewPoints(self.points.len()).into());
        }
        for (index, p) in self.points.iter().enumerate() {
            if !Coordinates::new(p.lat, p.lon).is_valid() {
                return Err(ValidationError::InvalidCoordinates {
                    index,
                    lat: p.lat,
                    lon: p.lon,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Points with cumulative along-track distance.
    pub fn route_points(&self) -> Vec<RoutePoint> {
        let mut distance = 0.0;
        let mut prev: Option<&RawPoint> = None;

        self.points
            .iter()
            .map(|p| {
                if let Some(q) = prev {
                    distance += haversine_km(q.lat, q.lon, p.lat, p.lon);
                }
                prev = Some(p);
                RoutePoint {
                    lat: p.lat,
                    lon: p.lon,
                    distance_km: distance,
                    elevation: p.elevation,
                    estimated_time: None,
                }
            })
            .collect()
    }
}

/// A position along a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    /// Cumulative distance from the start (km)
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub elevation: Option<f64>,
    /// Expected arrival, when a schedule was applied
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimated_time: Option<DateTime<Utc>>,
}

impl RoutePoint {
    pub fn new(lat: f64, lon: f64, distance_km: f64) -> Self {
        Self {
            lat,
            lon,
            distance_km,
            elevation: None,
            estimated_time: None,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_route_points_accumulate_distance() {
        let route = Route::new(
            "meridian",
            vec![
                RawPoint::new(45.0, 7.0),
                RawPoint::new(45.1, 7.0),
                RawPoint::new(45.2, 7.0).with_elevation(350.0),
            ],
        );

        let points = route.route_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].distance_km, 0.0);
        assert!(points[1].distance_km > 11.0 && points[1].distance_km < 11.2);
        assert!((points[2].distance_km - route.total_distance_km).abs() < 1e-9);
        assert_eq!(points[2].elevation, Some(350.0));
    }

    #[test]
    fn test_single_point_route_is_rejected() {
        let route = Route::new("dot", vec![RawPoint::new(45.0, 7.0)]);
        assert!(matches!(
            route.validate(),
            Err(Error::Validation(ValidationError::TooFewPoints(1)))
        ));
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let route = Route::new("bad", vec![RawPoint::new(45.0, 7.0), RawPoint::new(95.0, 7.0)]);
        assert!(matches!(
            route.validate(),
            Err(Error::Validation(ValidationError::InvalidCoordinates { index: 1, .. }))
        ));
    }
}
