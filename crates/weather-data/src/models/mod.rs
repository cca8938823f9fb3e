//! Weather data models
//!
//! This module contains the core data types for weather acquisition:
//! - `types` - Provider identifiers and coordinates
//! - `condition` - The shared condition taxonomy and provider code mappings
//! - `sample` - The canonical per-provider reading and derived quantities

mod condition;
mod sample;
mod types;

pub use condition::WeatherCondition;
pub use sample::{dew_point, WeatherSample, MAGNUS_A, MAGNUS_B};
pub use types::{Coordinates, ProviderId};
