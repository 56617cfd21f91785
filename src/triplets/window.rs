//! Sliding window extraction.
//!
//! For each position of a sentence, the context is the set of distinct token values found
//! up to `each_side` positions to the left and right (clipped at the sentence edges).
//! Each context value yields one triplet, whose negatives avoid the context values
//! and the center value.
use itertools::Itertools;
use log::trace;
use rand::Rng;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::sampling::NegativeSampler;
use crate::triplets::SgnsTriplet;
use crate::{TokenId, TokenSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowExtractor {
    each_side: usize,
    negatives: usize,
}

impl WindowExtractor {
    /// `window_size` is the total number of neighbour positions, `window_size / 2` on each side.
    pub fn new(window_size: usize, negatives: usize) -> Self {
        Self {
            each_side: window_size / 2,
            negatives,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.window_size, config.negatives)
    }

    pub fn each_side(&self) -> usize {
        self.each_side
    }

    pub fn negatives(&self) -> usize {
        self.negatives
    }

    /// Distinct token values around `position`, nearest left first, then nearest right first.
    ///
    /// The value at `position` is only included if it also occurs at another position of the window.
    pub fn contexts(&self, tokens: &[TokenId], position: usize) -> Vec<TokenId> {
        let start = position.saturating_sub(self.each_side);
        let end = tokens.len().min(position + 1 + self.each_side);

        (start..position)
            .rev()
            .chain(position + 1..end)
            .map(|idx| tokens[idx])
            .unique()
            .collect()
    }

    /// `(center, context)` pairs of a sentence, in emission order.
    pub fn pairs(&self, tokens: &[TokenId]) -> Vec<(TokenId, TokenId)> {
        tokens
            .iter()
            .enumerate()
            .flat_map(|(i, &center)| {
                self.contexts(tokens, i)
                    .into_iter()
                    .map(move |context| (center, context))
            })
            .collect()
    }

    /// Extract every triplet of a sentence, sampling negatives with `sampler`.
    pub fn extract<R: Rng + ?Sized>(
        &self,
        tokens: &[TokenId],
        sampler: &NegativeSampler<'_>,
        rng: &mut R,
    ) -> Result<Vec<SgnsTriplet>, Error> {
        let mut triplets = Vec::new();

        for (i, &center) in tokens.iter().enumerate() {
            let contexts = self.contexts(tokens, i);
            if contexts.is_empty() {
                continue;
            }

            // the center goes in after the contexts have been collected
            let mut forbidden: TokenSet = contexts.iter().copied().collect();
            forbidden.insert(center);

            for &context in &contexts {
                let negatives = sampler.sample(self.negatives, &forbidden, rng)?;
                triplets.push(SgnsTriplet::new(center, context, negatives));
            }
        }

        trace!("{} tokens -> {} triplets", tokens.len(), triplets.len());
        Ok(triplets)
    }
}
