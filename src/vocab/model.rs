//! Frequency model and smoothed negative sampling distribution.
use log::{debug, info};

use crate::error::Error;
use crate::TokenId;

/// Exponent applied to raw frequencies before normalisation.
pub const SMOOTHING_POWER: f64 = 0.75;

/// Token counts of a run and the distribution negatives are drawn from.
///
/// Ids are dense in `[0, size)`. The model is built once, after every sentence
/// has been tokenized, and is only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyModel {
    frequency: Vec<u64>,
    distribution: Vec<f64>,
}

impl VocabularyModel {
    /// Count every token of `sequences` and build the smoothed distribution.
    ///
    /// Fails with [Error::TokenOutOfRange] on the first id that is not below `vocab_size`.
    pub fn build<S>(sequences: &[S], vocab_size: usize) -> Result<Self, Error>
    where
        S: AsRef<[TokenId]>,
    {
        let mut frequency = vec![0u64; vocab_size];
        for sequence in sequences {
            for &token in sequence.as_ref() {
                match frequency.get_mut(token as usize) {
                    Some(count) => *count += 1,
                    None => return Err(Error::TokenOutOfRange { token, vocab_size }),
                }
            }
        }

        let model = Self::from_frequencies(frequency);
        info!(
            "vocabulary model: {} tokens observed, {}/{} ids seen",
            model.total_count(),
            model.observed(),
            model.size()
        );
        Ok(model)
    }

    /// Build a model from a dense frequency table (`frequency[id] = count`).
    pub fn from_frequencies(frequency: Vec<u64>) -> Self {
        let smoothed: Vec<f64> = frequency
            .iter()
            .map(|&count| (count as f64).powf(SMOOTHING_POWER))
            .collect();
        let total: f64 = smoothed.iter().sum();

        // no observed token: keep an all-zero distribution rather than NaNs
        let distribution = if total > 0.0 {
            smoothed.into_iter().map(|w| w / total).collect()
        } else {
            debug!("empty frequency table, distribution is all zeros");
            smoothed
        };

        Self {
            frequency,
            distribution,
        }
    }

    pub fn size(&self) -> usize {
        self.frequency.len()
    }

    pub fn frequency(&self, token: TokenId) -> u64 {
        self.frequency.get(token as usize).copied().unwrap_or(0)
    }

    pub fn probability(&self, token: TokenId) -> f64 {
        self.distribution.get(token as usize).copied().unwrap_or(0.0)
    }

    pub fn frequencies(&self) -> &[u64] {
        &self.frequency
    }

    pub fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    /// Total number of token occurrences.
    pub fn total_count(&self) -> u64 {
        self.frequency.iter().sum()
    }

    /// Number of ids seen at least once.
    pub fn observed(&self) -> usize {
        self.frequency.iter().filter(|&&c| c > 0).count()
    }
}
