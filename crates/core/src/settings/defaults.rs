//! Defaults for [`ForecastSettings`](super::ForecastSettings).
//!
//! | Field | Default | Valid range |
//! |-------|---------|-------------|
//! | `start_time` | now (UTC) | any |
//! | `average_speed_kmh` | 20.0 | (0, 120] |
//! | `interval_km` | 5.0 | [0.5, 100.0] |
//! | `units` | `Metric` | `Metric`, `Imperial` |
//! | `timezone` | `"UTC"` | any IANA name |

use super::forecast_settings::Units;

pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 20.0;
pub const DEFAULT_INTERVAL_KM: f64 = 5.0;
pub const DEFAULT_UNITS: Units = Units::Metric;
pub const DEFAULT_TIMEZONE: &str = "UTC";
