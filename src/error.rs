//! Error enum
use std::fmt;

use crate::TokenId;

/// A chunk that could not be turned into a published shard.
#[derive(Debug)]
pub struct ChunkFailure {
    pub chunk: usize,
    pub error: Error,
}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Reqwest(reqwest::Error),
    Url(url::ParseError),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Custom(String),

    /// Invalid pipeline configuration.
    Config(String),
    /// The tokenizer handed out an id outside of `[0, vocab_size)`.
    TokenOutOfRange { token: TokenId, vocab_size: usize },
    /// The tokenizer answered with something that can't be a token id (negative, too large, not an integer).
    InvalidTokenId(String),
    /// Neither the tokenizer nor the merges artifact could tell the vocabulary size.
    VocabularyUnknown(String),
    /// The forbidden set covers every token that has a non-zero sampling probability.
    VocabularyTooSmall { vocab_size: usize, forbidden: usize },
    /// Rejection sampling hit its round cap before collecting enough negatives.
    SamplingExhausted { wanted: usize, got: usize, rounds: usize },
    /// A single tokenizer attempt failed (transport or decoding).
    Tokenizer(String),
    /// Corpus source or shard sink failure.
    Storage(String),
    /// Phase 2 finished with at least one chunk missing its shard.
    ChunkFailures(Vec<ChunkFailure>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Serde(e) => write!(f, "json error: {e}"),
            Error::Reqwest(e) => write!(f, "http error: {e}"),
            Error::Url(e) => write!(f, "invalid url: {e}"),
            Error::Glob(e) => write!(f, "glob error: {e}"),
            Error::GlobPattern(e) => write!(f, "invalid glob pattern: {e}"),
            Error::Custom(s) => write!(f, "{s}"),
            Error::Config(s) => write!(f, "invalid configuration: {s}"),
            Error::TokenOutOfRange { token, vocab_size } => write!(
                f,
                "frequency model: token id {token} is out of range for vocabulary size {vocab_size}"
            ),
            Error::InvalidTokenId(s) => {
                write!(f, "tokenizer: {s} is not a valid token id")
            }
            Error::VocabularyUnknown(s) => write!(f, "vocabulary size unknown: {s}"),
            Error::VocabularyTooSmall {
                vocab_size,
                forbidden,
            } => write!(
                f,
                "negative sampling: forbidden set of {forbidden} tokens leaves no sampleable token in a vocabulary of {vocab_size}"
            ),
            Error::SamplingExhausted {
                wanted,
                got,
                rounds,
            } => write!(
                f,
                "negative sampling: only {got}/{wanted} negatives accepted after {rounds} rounds"
            ),
            Error::Tokenizer(s) => write!(f, "tokenizer: {s}"),
            Error::Storage(s) => write!(f, "storage: {s}"),
            Error::ChunkFailures(failures) => {
                write!(f, "chunk processing: {} chunk(s) failed", failures.len())?;
                for failure in failures {
                    write!(f, "\n  chunk {}: {}", failure.chunk, failure.error)?;
                }
                Ok(())
            }
        }
    }
}

impl Error {
    /// Whether another attempt could succeed.
    ///
    /// Contract violations of the tokenizer are not: the answer would be the same.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::InvalidTokenId(_) | Error::TokenOutOfRange { .. }
        )
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Reqwest(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Error {
        Error::Url(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
