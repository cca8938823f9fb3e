//! Multi-source consensus: merged values, agreement scoring and outliers.

mod aggregator;
mod fields;
mod model;

pub use aggregator::{agreement, ConsensusAggregator};
pub use fields::{
    WeatherField, HUMIDITY_REFERENCE_SCALE, MIN_SOURCES_FOR_OUTLIERS, OUTLIER_SIGMA,
    PRECIPITATION_REFERENCE_SCALE, PRESSURE_REFERENCE_SCALE, TEMP_REFERENCE_SCALE,
    WIND_SPEED_REFERENCE_SCALE,
};
pub use model::{ConditionVote, ConsensusField, ConsensusWeather};
