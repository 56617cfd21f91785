//! Corpus to SGNS triplets pipeline.
//!
//! # Processing
//! 1. Sentences of the selected corpus range are loaded from the [CorpusSource].
//! 1. Every sentence is tokenized concurrently. Sentences that fail every attempt,
//!    or that yield no token, are dropped. An answer that is not a valid token id stops the run.
//!    Sequences keep the sentence order, so chunks only depend on the corpus range.
//! 1. The vocabulary size is asked to the tokenizer (or read from a merges artifact),
//!    and the [VocabularyModel] is built from *all* token sequences.
//! 1. Sequences are cut in chunks that are turned into triplets and published as shards
//!    concurrently (see [ChunkOrchestrator]).
//!
//! Step 4 only starts once step 3 is complete: sampling probabilities depend on the
//! frequencies of the whole range.
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use log::{info, warn};

use crate::config::{self, PipelineConfig};
use crate::error::Error;
use crate::pipeline::{ChunkOrchestrator, Pipeline};
use crate::shard::ShardNamer;
use crate::storage::{self, CorpusSource, ShardEntry, ShardSink};
use crate::tokenizer::{TokenizationClient, Tokenizer};
use crate::triplets::WindowExtractor;
use crate::vocab::{self, VocabularyModel};

/// Where the vocabulary size comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabSource {
    /// Ask the tokenizer service.
    Tokenizer,
    /// Read a merges artifact.
    Merges(PathBuf),
}

/// Accounting of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub sentences: usize,
    /// Sentences dropped after every tokenizer attempt failed.
    pub failed: usize,
    /// Sentences the tokenizer returned no token for.
    pub unprocessable: usize,
    pub sequences: usize,
    pub tokens: u64,
    pub vocab_size: usize,
    pub chunks: usize,
    pub triplets: usize,
    pub shards: Vec<ShardEntry>,
}

impl RunSummary {
    pub fn dropped(&self) -> usize {
        self.failed + self.unprocessable
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {}: {} sentences, {} dropped ({} failed, {} unprocessable)",
            self.run_id,
            self.sentences,
            self.dropped(),
            self.failed,
            self.unprocessable
        )?;
        writeln!(
            f,
            "{} token sequences, {} tokens, vocabulary size {}",
            self.sequences, self.tokens, self.vocab_size
        )?;
        write!(
            f,
            "{} chunks processed, {} triplets in {} shards",
            self.chunks,
            self.triplets,
            self.shards.len()
        )
    }
}

pub struct SgnsPipeline<T, S, K> {
    client: TokenizationClient<T>,
    source: S,
    sink: K,
    range: Range<usize>,
    vocab_source: VocabSource,
    config: PipelineConfig,
}

impl<T, S, K> SgnsPipeline<T, S, K>
where
    T: Tokenizer,
    S: CorpusSource,
    K: ShardSink,
{
    pub fn new(
        tokenizer: T,
        source: S,
        sink: K,
        range: Range<usize>,
        config: PipelineConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        let client = TokenizationClient::new(
            tokenizer,
            config.retry.clone(),
            config::workers(config.tokenizer_worker_ratio),
        );

        Ok(Self {
            client,
            source,
            sink,
            range,
            vocab_source: VocabSource::Tokenizer,
            config,
        })
    }

    pub fn vocab_source(mut self, vocab_source: VocabSource) -> Self {
        self.vocab_source = vocab_source;
        self
    }

    async fn vocabulary_size(&self) -> Result<usize, Error> {
        match &self.vocab_source {
            VocabSource::Tokenizer => self.client.vocabulary_size().await,
            VocabSource::Merges(path) => vocab::vocab_size_from_merges(path).ok_or_else(|| {
                Error::VocabularyUnknown(format!("no vocabulary size in {:?}", path))
            }),
        }
    }
}

impl<T, S, K> Pipeline<RunSummary> for SgnsPipeline<T, S, K>
where
    T: Tokenizer,
    S: CorpusSource,
    K: ShardSink,
{
    fn run(&self) -> Result<RunSummary, Error> {
        let sentences = storage::load_sentences(&self.source, self.range.clone())?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        // phase 1: tokenization
        let tokenized = runtime.block_on(self.client.tokenize_all(&sentences))?;
        let vocab_size = runtime.block_on(self.vocabulary_size())?;
        if vocab_size <= self.config.window_size {
            return Err(Error::VocabularyTooSmall {
                vocab_size,
                forbidden: self.config.window_size + 1,
            });
        }

        // barrier: the model needs every sequence
        let model = VocabularyModel::build(&tokenized.sequences, vocab_size)?;

        // phase 2: chunks
        let namer = match &self.config.run_id {
            Some(run_id) => ShardNamer::new(run_id.clone()),
            None => ShardNamer::random(),
        };
        let run_id = namer.run_id().to_string();
        let orchestrator = ChunkOrchestrator::new(
            WindowExtractor::from_config(&self.config),
            self.config.chunk_size,
            config::workers(self.config.chunk_worker_ratio),
            namer,
            &self.sink,
        )
        .shuffle(self.config.shuffle)
        .seed(self.config.seed);

        if tokenized.sequences.is_empty() {
            warn!("run {}: no sentence could be tokenized", run_id);
        }
        let report = orchestrator.run(&tokenized.sequences, &model)?;

        let summary = RunSummary {
            run_id,
            sentences: sentences.len(),
            failed: tokenized.failed,
            unprocessable: tokenized.unprocessable,
            sequences: tokenized.sequences.len(),
            tokens: model.total_count(),
            vocab_size,
            chunks: report.chunks,
            triplets: report.triplets,
            shards: report.shards,
        };
        info!("{}", summary);
        Ok(summary)
    }
}
