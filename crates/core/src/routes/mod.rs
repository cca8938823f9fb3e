//! Routes and route sampling.

pub mod geo;
mod model;
mod sampler;

pub use model::{RawPoint, Route, RoutePoint};
pub use sampler::{estimate_sample_count, RouteSampler};
