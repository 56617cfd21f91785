//! Negative sampling.
//!
//! Negatives are drawn from the smoothed distribution of a [VocabularyModel] by rejection:
//! draw a batch of `k` candidates, keep those outside the forbidden set, repeat until `k`
//! are kept. Inputs where no candidate can ever be kept are refused up front and the
//! number of batches is capped, so sampling always terminates.
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::Error;
use crate::vocab::VocabularyModel;
use crate::{TokenId, TokenSet};

/// Maximum number of candidate batches drawn for one call to [NegativeSampler::sample].
pub const MAX_ROUNDS: usize = 1_000;

pub struct NegativeSampler<'a> {
    model: &'a VocabularyModel,
    index: WeightedIndex<f64>,
    observed: usize,
}

impl<'a> NegativeSampler<'a> {
    /// Fails with [Error::VocabularyTooSmall] if the model has no token to sample from.
    pub fn new(model: &'a VocabularyModel) -> Result<Self, Error> {
        let index = WeightedIndex::new(model.distribution()).map_err(|_| {
            Error::VocabularyTooSmall {
                vocab_size: model.size(),
                forbidden: 0,
            }
        })?;

        Ok(Self {
            model,
            index,
            observed: model.observed(),
        })
    }

    /// Draw `k` token ids, none of them in `forbidden`. Ids may repeat.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        k: usize,
        forbidden: &TokenSet,
        rng: &mut R,
    ) -> Result<Vec<TokenId>, Error> {
        if k == 0 {
            return Ok(Vec::new());
        }

        // every token carrying probability mass is forbidden: nothing can be accepted
        let forbidden_observed = forbidden
            .iter()
            .filter(|&&t| self.model.probability(t) > 0.0)
            .count();
        if forbidden_observed >= self.observed {
            return Err(Error::VocabularyTooSmall {
                vocab_size: self.model.size(),
                forbidden: forbidden.len(),
            });
        }

        let mut negatives = Vec::with_capacity(k);
        for _ in 0..MAX_ROUNDS {
            for _ in 0..k {
                let candidate = self.index.sample(rng) as TokenId;
                if !forbidden.contains(&candidate) {
                    negatives.push(candidate);
                    if negatives.len() == k {
                        return Ok(negatives);
                    }
                }
            }
        }

        Err(Error::SamplingExhausted {
            wanted: k,
            got: negatives.len(),
            rounds: MAX_ROUNDS,
        })
    }
}
