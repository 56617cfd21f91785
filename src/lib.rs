//! # polyvec
//!
//! Training data preparation for skip-gram with negative sampling (SGNS) embeddings.
//!
//! A corpus range is tokenized by a remote tokenizer, token frequencies are turned into a
//! smoothed negative sampling distribution and every sentence is turned into
//! `(center, context, negatives)` triplets, written as shards to an object store.
//!
//! The [pipeline::SgnsPipeline] glues everything together; the other modules can be used on
//! their own.
use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use twox_hash::XxHash64;

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sampling;
pub mod shard;
pub mod storage;
pub mod tokenizer;
pub mod triplets;
pub mod vocab;

/// Tokenizer-assigned token id. Ids of a vocabulary of size `n` are `0..n`.
pub type TokenId = u32;

/// Set of token ids, used for window and forbidden sets.
pub type TokenSet = HashSet<TokenId, BuildHasherDefault<XxHash64>>;
