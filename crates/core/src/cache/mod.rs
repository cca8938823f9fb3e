//! Content-addressed caches for forecasts and parsed routes.

mod backend;
mod forecast_cache;
mod key;
mod memory;
mod route_cache;
mod sweeper;

pub use backend::{CacheBackend, StoredValue};
pub use forecast_cache::{CacheEntry, CacheStats, ForecastCache};
pub use key::{forecast_cache_key, route_cache_key};
pub use memory::MemoryCacheBackend;
pub use route_cache::RouteCache;
pub use sweeper::{spawn_sweeper, spawn_sweeper_with};
