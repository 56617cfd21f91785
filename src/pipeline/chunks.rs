/*!
Chunked triplet generation.

Token sequences are cut into contiguous chunks of `chunk_size` sequences. Chunks are
processed concurrently on a dedicated thread pool and each one ends up as exactly one shard.
A failing chunk doesn't stop the others: every failure is collected and reported once
all chunks are done.
!*/
use log::{error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::{ChunkFailure, Error};
use crate::sampling::NegativeSampler;
use crate::shard::{self, ShardNamer};
use crate::storage::{ShardEntry, ShardSink};
use crate::triplets::WindowExtractor;
use crate::vocab::VocabularyModel;
use crate::TokenId;

/// What phase 2 produced.
#[derive(Debug, Default)]
pub struct ChunkReport {
    pub chunks: usize,
    pub triplets: usize,
    /// One entry per chunk, in chunk order.
    pub shards: Vec<ShardEntry>,
}

pub struct ChunkOrchestrator<'a, K: ShardSink + ?Sized> {
    extractor: WindowExtractor,
    chunk_size: usize,
    workers: usize,
    shuffle: bool,
    seed: Option<u64>,
    namer: ShardNamer,
    sink: &'a K,
}

impl<'a, K: ShardSink + ?Sized> ChunkOrchestrator<'a, K> {
    pub fn new(
        extractor: WindowExtractor,
        chunk_size: usize,
        workers: usize,
        namer: ShardNamer,
        sink: &'a K,
    ) -> Self {
        Self {
            extractor,
            chunk_size: chunk_size.max(1),
            workers: workers.max(1),
            shuffle: true,
            seed: None,
            namer,
            sink,
        }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Number of chunks `nb_sequences` sequences are split into.
    pub fn nb_chunks(&self, nb_sequences: usize) -> usize {
        (nb_sequences + self.chunk_size - 1) / self.chunk_size
    }

    /// Generate and publish the shards of every chunk of `sequences`.
    pub fn run(
        &self,
        sequences: &[Vec<TokenId>],
        model: &VocabularyModel,
    ) -> Result<ChunkReport, Error> {
        let nb_chunks = self.nb_chunks(sequences.len());
        if nb_chunks == 0 {
            info!("no token sequence, no shard to write");
            return Ok(ChunkReport::default());
        }

        let sampler = NegativeSampler::new(model)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("chunk-worker-{}", i))
            .build()
            .map_err(|e| Error::Custom(format!("could not build chunk worker pool: {}", e)))?;

        info!(
            "processing {} chunks of up to {} sequences with {} workers",
            nb_chunks, self.chunk_size, self.workers
        );

        let results: Vec<(usize, Result<(ShardEntry, usize), Error>)> = pool.install(|| {
            sequences
                .par_chunks(self.chunk_size)
                .enumerate()
                .map(|(idx, chunk)| (idx, self.process_chunk(idx, chunk, &sampler)))
                .collect()
        });

        let mut report = ChunkReport {
            chunks: nb_chunks,
            ..Default::default()
        };
        let mut failures = Vec::new();
        for (chunk, result) in results {
            match result {
                Ok((entry, nb_triplets)) => {
                    report.triplets += nb_triplets;
                    report.shards.push(entry);
                }
                Err(error) => {
                    error!("chunk {} failed: {}", chunk, error);
                    failures.push(ChunkFailure { chunk, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(Error::ChunkFailures(failures))
        }
    }

    fn rng(&self, chunk: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(chunk as u64)),
            None => StdRng::from_entropy(),
        }
    }

    fn process_chunk(
        &self,
        idx: usize,
        chunk: &[Vec<TokenId>],
        sampler: &NegativeSampler<'_>,
    ) -> Result<(ShardEntry, usize), Error> {
        let mut rng = self.rng(idx);

        let mut triplets = Vec::new();
        for sequence in chunk {
            triplets.extend(self.extractor.extract(sequence, sampler, &mut rng)?);
        }
        if self.shuffle {
            triplets.shuffle(&mut rng);
        }

        let blob = shard::encode(&triplets)?;
        let name = self.namer.name(idx);
        self.sink.put(&name, &blob)?;

        info!(
            "chunk {}: {} sequences -> {} triplets in {}",
            idx,
            chunk.len(),
            triplets.len(),
            name
        );
        let entry = ShardEntry {
            name,
            size: blob.len() as u64,
            checksum: Some(shard::checksum(&blob)),
        };
        Ok((entry, triplets.len()))
    }
}
