//! Pipeline-wide constants.

/// Mean Earth radius in km (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Smallest sampling interval accepted, in km
pub const MIN_INTERVAL_KM: f64 = 0.5;

/// Largest sampling interval accepted, in km
pub const MAX_INTERVAL_KM: f64 = 100.0;

/// Upper bound for the average speed setting, in km/h
pub const MAX_AVERAGE_SPEED_KMH: f64 = 120.0;

/// Forecast entries go stale quickly.
pub const DEFAULT_FORECAST_TTL_SECS: u64 = 30 * 60;

/// Parsed routes only change when their source does.
pub const DEFAULT_ROUTE_TTL_SECS: u64 = 24 * 60 * 60;

/// Routes with more sample points than this are delivered progressively.
pub const DEFAULT_PROGRESSIVE_THRESHOLD: usize = 100;

/// Points per progressive chunk
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Pause between progressive chunks, in ms
pub const DEFAULT_INTER_CHUNK_DELAY_MS: u64 = 250;

/// Points fetched concurrently within a chunk
pub const DEFAULT_POINT_CONCURRENCY: usize = 4;

/// Interval between cache sweeps when a sweeper is running, in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Inbound requests per client per minute
pub const DEFAULT_CLIENT_REQUESTS_PER_MINUTE: u32 = 30;

/// Inbound requests per client per day
pub const DEFAULT_CLIENT_REQUESTS_PER_DAY: u32 = 1_000;
