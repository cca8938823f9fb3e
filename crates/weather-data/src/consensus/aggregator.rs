//! Statistical merge of per-provider samples.
//!
//! For every numeric field the merged value is the mean and the spread is the
//! population variance. Wind direction is averaged on the circle. The condition
//! is decided by majority vote, ties going to the provider that comes first in
//! the configured priority order.
//!
//! Outliers are detected leave-one-out: a source is flagged when its value is
//! more than [`OUTLIER_SIGMA`] deviations away from the mean of the *other*
//! sources, the deviation being the others' standard deviation or the field's
//! noise floor, whichever is larger. With population statistics an in-sample
//! z-score never exceeds `(n-1)/sqrt(n)`, so an in-sample test could not fire
//! below six sources.

use std::collections::BTreeMap;

use log::debug;

use super::fields::{WeatherField, MIN_SOURCES_FOR_OUTLIERS, OUTLIER_SIGMA};
use super::model::{ConditionVote, ConsensusField, ConsensusWeather};
use crate::errors::WeatherDataError;
use crate::models::{ProviderId, WeatherCondition, WeatherSample};

/// Merges samples for the same point into a [`ConsensusWeather`].
#[derive(Debug, Clone, Default)]
pub struct ConsensusAggregator {
    priority_order: Vec<ProviderId>,
}

impl ConsensusAggregator {
    /// `priority_order` lists provider ids, highest priority first.
    pub fn new(priority_order: Vec<ProviderId>) -> Self {
        Self { priority_order }
    }

    /// Merge the samples of every provider that answered for one point.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherDataError::Consensus`] when `samples` is empty.
    pub fn aggregate(&self, samples: &[WeatherSample]) -> Result<ConsensusWeather, WeatherDataError> {
        if samples.is_empty() {
            return Err(WeatherDataError::Consensus(
                "no provider produced data".to_string(),
            ));
        }

        let sources: Vec<ProviderId> = samples.iter().map(|s| s.provider_id.clone()).collect();

        let mut fields = BTreeMap::new();
        let mut agreements = Vec::new();
        let mut outliers: Vec<ProviderId> = Vec::new();

        for field in WeatherField::ALL {
            let values: Vec<f64> = samples.iter().map(|s| field.extract(s)).collect();

            let (value, variance) = if field.is_circular() {
                circular_stats(&values)
            } else {
                linear_stats(&values)
            };

            let agreement = field
                .reference_scale()
                .map(|scale| agreement(variance, scale));
            if let Some(a) = agreement {
                agreements.push(a);
            }

            if let Some(floor) = field.noise_floor() {
                for idx in outlier_indices(&values, floor) {
                    let id = &samples[idx].provider_id;
                    debug!("{} is an outlier on {} ({})", id, field, values[idx]);
                    if !outliers.contains(id) {
                        outliers.push(id.clone());
                    }
                }
            }

            fields.insert(
                field,
                ConsensusField {
                    value,
                    variance,
                    contributing_sources: sources.clone(),
                    agreement,
                },
            );
        }

        let agreement_score = if samples.len() == 1 || agreements.is_empty() {
            100.0
        } else {
            agreements.iter().sum::<f64>() / agreements.len() as f64
        };

        outliers.sort_by_key(|id| self.rank(id));

        Ok(ConsensusWeather {
            fields,
            condition: self.vote(samples),
            agreement_score,
            outlier_sources: outliers,
            source_count: samples.len(),
        })
    }

    /// Position of a provider in the priority order; unknown providers last.
    fn rank(&self, id: &ProviderId) -> usize {
        self.priority_order
            .iter()
            .position(|p| p == id)
            .unwrap_or(self.priority_order.len())
    }

    fn vote(&self, samples: &[WeatherSample]) -> ConditionVote {
        // condition -> (votes, best rank among its voters)
        let mut tally: BTreeMap<WeatherCondition, (usize, usize)> = BTreeMap::new();
        for sample in samples {
            let rank = self.rank(&sample.provider_id);
            let entry = tally.entry(sample.condition_code).or_insert((0, usize::MAX));
            entry.0 += 1;
            entry.1 = entry.1.min(rank);
        }

        let (value, votes) = tally
            .iter()
            .max_by(|(_, (va, ra)), (_, (vb, rb))| va.cmp(vb).then(rb.cmp(ra)))
            .map(|(condition, (votes, _))| (*condition, *votes))
            .unwrap_or((WeatherCondition::default(), 0));

        ConditionVote {
            value,
            votes,
            total: samples.len(),
            contributing_sources: samples
                .iter()
                .filter(|s| s.condition_code == value)
                .map(|s| s.provider_id.clone())
                .collect(),
        }
    }
}

/// `clamp(100 * (1 - variance / scale), 0, 100)`
pub fn agreement(variance: f64, scale: f64) -> f64 {
    (100.0 * (1.0 - variance / scale)).clamp(0.0, 100.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean and population variance.
fn linear_stats(values: &[f64]) -> (f64, f64) {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    (m, variance)
}

/// Circular mean in [0, 360) and mean squared angular deviation (deg²).
fn circular_stats(degrees: &[f64]) -> (f64, f64) {
    let n = degrees.len() as f64;
    let (sin_sum, cos_sum) = degrees.iter().fold((0.0, 0.0), |(s, c), d| {
        let r = d.to_radians();
        (s + r.sin(), c + r.cos())
    });
    let m = (sin_sum / n).atan2(cos_sum / n).to_degrees().rem_euclid(360.0);

    let variance = degrees
        .iter()
        .map(|d| angular_difference(*d, m).powi(2))
        .sum::<f64>()
        / n;
    (m, variance)
}

/// Smallest signed difference between two bearings, in (-180, 180].
fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

fn outlier_indices(values: &[f64], noise_floor: f64) -> Vec<usize> {
    if values.len() < MIN_SOURCES_FOR_OUTLIERS {
        return Vec::new();
    }

    (0..values.len())
        .filter(|&i| {
            let others: Vec<f64> = values
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, v)| *v)
                .collect();
            let (m, variance) = linear_stats(&others);
            let unit = variance.sqrt().max(noise_floor);
            (values[i] - m).abs() > OUTLIER_SIGMA * unit
        })
        .collect()
}
