use serde::{Deserialize, Serialize};

use crate::TokenId;

/// A center token, one true context token and `K` negatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SgnsTriplet {
    pub center: TokenId,
    pub context: TokenId,
    pub negatives: Vec<TokenId>,
}

impl SgnsTriplet {
    pub fn new(center: TokenId, context: TokenId, negatives: Vec<TokenId>) -> Self {
        Self {
            center,
            context,
            negatives,
        }
    }

    /// `(center, context)`, the part of the triplet that doesn't depend on sampling.
    pub fn pair(&self) -> (TokenId, TokenId) {
        (self.center, self.context)
    }
}
