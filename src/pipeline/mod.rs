//! Pipelines.
//!
//! The module provides a light [Pipeline] trait and [SgnsPipeline], the
//! corpus-to-triplets pipeline.
pub mod chunks;
mod sgns;

use crate::error::Error;

pub use chunks::{ChunkOrchestrator, ChunkReport};
pub use sgns::{RunSummary, SgnsPipeline, VocabSource};

/// This trait must be implemented for each Pipeline,
/// and is generic over the return type so that
/// any custom pipeline that needs a return type can use the
/// trait aswell.
pub trait Pipeline<T> {
    fn run(&self) -> Result<T, Error>;
}
