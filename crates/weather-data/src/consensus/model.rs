use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fields::WeatherField;
use crate::models::{ProviderId, WeatherCondition};

/// Merged value of one field across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusField<T = f64> {
    pub value: T,
    /// Population variance of the contributing values
    pub variance: f64,
    pub contributing_sources: Vec<ProviderId>,
    /// 0..=100, only for fields with a reference scale
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agreement: Option<f64>,
}

/// Result of the condition majority vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionVote {
    pub value: WeatherCondition,
    /// Votes received by the winning condition
    pub votes: usize,
    pub total: usize,
    pub contributing_sources: Vec<ProviderId>,
}

/// Cross-provider merge of the samples for a single route point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusWeather {
    pub fields: BTreeMap<WeatherField, ConsensusField>,
    pub condition: ConditionVote,
    /// Mean of the per-field agreements, 0..=100
    pub agreement_score: f64,
    pub outlier_sources: Vec<ProviderId>,
    pub source_count: usize,
}

impl ConsensusWeather {
    pub fn field(&self, field: WeatherField) -> Option<&ConsensusField> {
        self.fields.get(&field)
    }

    /// Merged value of a field, if any source reported it.
    pub fn value(&self, field: WeatherField) -> Option<f64> {
        self.fields.get(&field).map(|f| f.value)
    }
}
