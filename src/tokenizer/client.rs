//! Retrying, concurrency-bounded tokenization of a sentence batch.
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::error::Error;
use crate::tokenizer::{RetryPolicy, Tokenizer};
use crate::TokenId;

/// Result of encoding one sentence.
#[derive(Debug)]
pub enum Outcome {
    Encoded(Vec<TokenId>),
    /// The tokenizer answered with no token.
    Unprocessable,
    /// Every attempt failed. Holds the error of the last one.
    Failed(Error),
}

/// Token sequences of a batch, with the accounting of dropped sentences.
#[derive(Debug, Default)]
pub struct Tokenized {
    /// One sequence per encoded sentence, in sentence order.
    pub sequences: Vec<Vec<TokenId>>,
    /// Sentences dropped after exhausting every attempt.
    pub failed: usize,
    /// Sentences the tokenizer returned no token for.
    pub unprocessable: usize,
}

impl Tokenized {
    pub fn dropped(&self) -> usize {
        self.failed + self.unprocessable
    }
}

pub struct TokenizationClient<T> {
    tokenizer: T,
    retry: RetryPolicy,
    workers: usize,
}

impl<T: Tokenizer> TokenizationClient<T> {
    /// `workers` bounds the number of requests in flight (at least one).
    pub fn new(tokenizer: T, retry: RetryPolicy, workers: usize) -> Self {
        Self {
            tokenizer,
            retry,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Encode a sentence, retrying transient failures.
    ///
    /// Errors that are not [retryable](Error::is_retryable) are returned as is: they break
    /// the tokenizer contract and must stop the run instead of dropping the sentence.
    pub async fn encode(&self, sentence: &str) -> Result<Outcome, Error> {
        let res = self
            .retry
            .run("encode", || self.tokenizer.encode(sentence))
            .await;

        match res {
            Ok(tokens) if tokens.is_empty() => Ok(Outcome::Unprocessable),
            Ok(tokens) => Ok(Outcome::Encoded(tokens)),
            Err(e) if !e.is_retryable() => Err(e),
            Err(e) => Ok(Outcome::Failed(e)),
        }
    }

    /// Vocabulary size, with the same retry policy as encoding.
    ///
    /// Exhausting the attempts is fatal: the size can't be guessed.
    pub async fn vocabulary_size(&self) -> Result<usize, Error> {
        self.retry
            .run("vocabulary size", || self.tokenizer.vocabulary_size())
            .await
            .map_err(|e| Error::VocabularyUnknown(e.to_string()))
    }

    /// Encode every sentence, at most [Self::workers] at a time.
    ///
    /// Requests complete in any order, sequences are put back in sentence order once all are done.
    pub async fn tokenize_all(&self, sentences: &[String]) -> Result<Tokenized, Error> {
        info!(
            "tokenizing {} sentences with {} workers",
            sentences.len(),
            self.workers
        );

        let mut outcomes = stream::iter(sentences.iter().enumerate())
            .map(|(idx, sentence)| async move { (idx, self.encode(sentence).await) })
            .buffer_unordered(self.workers);

        let mut tokenized = Tokenized::default();
        let mut encoded = Vec::with_capacity(sentences.len());
        while let Some((idx, outcome)) = outcomes.next().await {
            match outcome? {
                Outcome::Encoded(tokens) => encoded.push((idx, tokens)),
                Outcome::Unprocessable => {
                    debug!("sentence {} has no tokens, dropping", idx);
                    tokenized.unprocessable += 1;
                }
                Outcome::Failed(e) => {
                    warn!("dropping sentence {}: {}", idx, e);
                    tokenized.failed += 1;
                }
            }
        }
        encoded.sort_unstable_by_key(|(idx, _)| *idx);
        tokenized.sequences = encoded.into_iter().map(|(_, tokens)| tokens).collect();

        info!(
            "tokenized {}/{} sentences ({} failed, {} unprocessable)",
            tokenized.sequences.len(),
            sentences.len(),
            tokenized.failed,
            tokenized.unprocessable
        );
        Ok(tokenized)
    }
}
