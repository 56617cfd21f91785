//! Pipeline parameters.
//!
//! [PipelineConfig] gathers every knob of a run. It can be loaded from a JSON file
//! and is then overridden by command line flags (see [crate::cli]).
use std::fs::File;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tokenizer::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Total number of neighbour positions, split evenly on both sides of the center.
    pub window_size: usize,
    /// Number of negatives per triplet (K).
    pub negatives: usize,
    /// Number of token sequences per chunk (and thus per shard).
    pub chunk_size: usize,
    /// Fraction of cores used as the in-flight tokenizer request bound.
    pub tokenizer_worker_ratio: f64,
    /// Fraction of cores used for the chunk worker pool.
    pub chunk_worker_ratio: f64,
    pub retry: RetryPolicy,
    /// Shuffle the triplets of a shard before writing it.
    pub shuffle: bool,
    /// Base seed; chunk `c` uses `seed + c`. Entropy when absent.
    pub seed: Option<u64>,
    /// Prefix of every shard name. A random UUID when absent.
    pub run_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            negatives: 15,
            chunk_size: 10_000,
            tokenizer_worker_ratio: 0.75,
            chunk_worker_ratio: 0.9,
            retry: RetryPolicy::default(),
            shuffle: true,
            seed: None,
            run_id: None,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take their default value.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        debug!("loading configuration from {:?}", path);
        let f = File::open(path)?;
        let config: Self = serde_json::from_reader(f)?;
        Ok(config)
    }

    /// Number of positions considered on each side of a center token.
    pub fn each_side(&self) -> usize {
        self.window_size / 2
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.window_size < 2 {
            return Err(Error::Config(format!(
                "window_size must be at least 2 (got {})",
                self.window_size
            )));
        }
        if self.negatives == 0 {
            return Err(Error::Config("negatives must be greater than zero".into()));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        for (name, ratio) in [
            ("tokenizer_worker_ratio", self.tokenizer_worker_ratio),
            ("chunk_worker_ratio", self.chunk_worker_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(Error::Config(format!(
                    "{name} must be in (0, 1] (got {ratio})"
                )));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Size of a worker pool using `ratio` of the available cores, never less than one.
pub fn workers(ratio: f64) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    workers_for(cores, ratio)
}

fn workers_for(cores: usize, ratio: f64) -> usize {
    ((cores as f64 * ratio).floor() as usize).max(1)
}
