/*! Vocabulary

Token frequencies, the smoothed negative sampling distribution built from them,
and the merges-artifact vocabulary size oracle.
!*/
mod merges;
mod model;

pub use merges::vocab_size_from_merges;
pub use model::{VocabularyModel, SMOOTHING_POWER};
