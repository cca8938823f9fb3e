use serde::{Deserialize, Serialize};

use routecast_weather_data::ProviderId;

/// Whether a request uses one provider or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Primary provider only
    #[default]
    Single,
    /// Every enabled provider (or the selected subset), merged by consensus
    Multi,
}

/// Caller preference for how points are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPreferences {
    pub mode: ForecastMode,
    /// Restrict multi-source fetching to these providers
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub providers: Option<Vec<ProviderId>>,
}

impl ForecastPreferences {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn multi() -> Self {
        Self {
            mode: ForecastMode::Multi,
            providers: None,
        }
    }

    pub fn with_providers(mut self, providers: Vec<ProviderId>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Provider selection in canonical (sorted, deduplicated) order.
    pub fn sorted_providers(&self) -> Option<Vec<ProviderId>> {
        self.providers.as_ref().map(|p| {
            let mut sorted = p.clone();
            sorted.sort();
            sorted.dedup();
            sorted
        })
    }
}
