use serde::{Deserialize, Serialize};

/// Shared weather condition taxonomy.
///
/// Every provider's proprietary condition/icon codes are folded into these six
/// categories so that samples from different sources can be compared and voted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum WeatherCondition {
    #[default]
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Fog,
}

impl WeatherCondition {
    /// Convert a WMO weather code (Open-Meteo) to a condition.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=3 => Self::Clouds,
            45 | 48 => Self::Fog,
            51..=67 | 80..=82 => Self::Rain,
            71..=77 | 85 | 86 => Self::Snow,
            95..=99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Convert an OpenWeatherMap condition id.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_id(id: i32) -> Self {
        match id {
            200..=299 => Self::Thunderstorm,
            300..=399 | 500..=599 => Self::Rain,
            600..=699 => Self::Snow,
            700..=799 => Self::Fog,
            800 => Self::Clear,
            801..=899 => Self::Clouds,
            _ => Self::Clear,
        }
    }

    /// Convert a WeatherAPI.com condition code.
    /// See: https://www.weatherapi.com/docs/weather_conditions.json
    pub fn from_weatherapi_code(code: i32) -> Self {
        match code {
            1000 => Self::Clear,
            1003 | 1006 | 1009 => Self::Clouds,
            1030 | 1135 | 1147 => Self::Fog,
            1087 | 1273..=1282 => Self::Thunderstorm,
            1066 | 1069 | 1114 | 1117 | 1204..=1237 | 1249..=1264 => Self::Snow,
            1063 | 1072 | 1150..=1201 | 1240..=1246 => Self::Rain,
            _ => Self::Clear,
        }
    }

    /// Whether this condition implies falling precipitation.
    pub fn is_precipitating(&self) -> bool {
        matches!(self, Self::Rain | Self::Snow | Self::Thunderstorm)
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Fog => "Fog",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
