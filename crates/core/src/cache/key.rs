//! Content-addressed cache keys.
//!
//! The forecast key is the SHA-256 of a canonical text rendering of the
//! route, the settings and the fetch preferences:
//! - every route point as `lat,lon,distance,elevation` with lat/lon to 6
//!   decimals, distance to 3 and elevation to 1 (`-` when absent)
//! - every [`ForecastSettings`] field, with speed and interval at full
//!   precision since both change where samples fall
//! - the preference mode and the sorted provider selection
//!
//! Preferences are included because single- and multi-source results differ
//! for the same route.

use std::fmt::Write;

use chrono::SecondsFormat;
use sha2::{Digest, Sha256};

use crate::routes::RoutePoint;
use crate::settings::{ForecastMode, ForecastPreferences, ForecastSettings};

const KEY_VERSION: &str = "forecast-v2";

/// Computes the forecast cache key for a request.
pub fn forecast_cache_key(
    points: &[RoutePoint],
    settings: &ForecastSettings,
    preferences: &ForecastPreferences,
) -> String {
    let mut canonical = String::with_capacity(points.len() * 40 + 128);
    canonical.push_str(KEY_VERSION);
    canonical.push('\n');

    for p in points {
        // Writing to a String cannot fail
        let _ = write!(canonical, "{:.6},{:.6},{:.3},", p.lat, p.lon, p.distance_km);
        match p.elevation {
            Some(e) => {
                let _ = write!(canonical, "{:.1}", e);
            }
            None => canonical.push('-'),
        }
        canonical.push(';');
    }
    canonical.push('\n');

    let _ = writeln!(
        canonical,
        "{}|{}|{}|{}|{}",
        settings
            .start_time
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        settings.average_speed_kmh,
        settings.interval_km,
        settings.units.as_str(),
        settings.timezone,
    );

    canonical.push_str(match preferences.mode {
        ForecastMode::Single => "single",
        ForecastMode::Multi => "multi",
    });
    canonical.push('|');
    if let Some(providers) = preferences.sorted_providers() {
        canonical.push_str(&providers.join(","));
    } else {
        canonical.push('*');
    }

    sha256_hex(canonical.as_bytes())
}

/// Key for a parsed route, from the bytes it was parsed from.
pub fn route_cache_key(source: &[u8]) -> String {
    format!("route:{}", sha256_hex(source))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
