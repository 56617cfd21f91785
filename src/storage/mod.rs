/*! Object storage

The corpus and the produced shards live in object stores, reached through two traits:

- [CorpusSource] lists and fetches corpus objects (JSON, language label → sentences),
- [ShardSink] publishes shards and lists the published ones.

[LocalStorage] implements both over a local directory.
!*/
pub mod corpus;
mod local;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use corpus::load_sentences;
pub use local::LocalStorage;

pub trait CorpusSource: Send + Sync {
    /// Keys of every object of the corpus, in no particular order.
    fn keys(&self) -> Result<Vec<String>, Error>;
    fn fetch(&self, key: &str) -> Result<Vec<u8>, Error>;
}

pub trait ShardSink: Send + Sync {
    /// Publish `data` under `name`.
    ///
    /// Implementations must never expose a partially written shard under `name`.
    fn put(&self, name: &str, data: &[u8]) -> Result<(), Error>;

    /// Every published shard, sorted by name.
    fn list(&self) -> Result<Vec<ShardEntry>, Error>;
}

/// A published shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardEntry {
    pub name: String,
    /// Size of the stored blob, in bytes.
    pub size: u64,
    /// Hex SHA-256 of the stored blob, when known.
    pub checksum: Option<String>,
}
