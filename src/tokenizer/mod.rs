/*! Tokenization

The tokenizer is a remote service, reached through the [Tokenizer] trait.
A [Tokenizer] call is a single attempt: [TokenizationClient] adds the retry policy
and bounds the number of requests in flight.

[HttpTokenizer] talks to the HTTP tokenizer service:

| endpoint                | request            | response                       |
|-------------------------|--------------------|--------------------------------|
| `POST /encode`          | JSON string        | `{"tokens": [u32, ...]}`       |
| `GET /vocabulary-size`  |                    | `{"vocabulary_size": usize}`   |
!*/
mod client;
mod http;
mod retry;

use async_trait::async_trait;

use crate::error::Error;
use crate::TokenId;

pub use client::{Outcome, TokenizationClient, Tokenized};
pub use http::HttpTokenizer;
pub use retry::RetryPolicy;

#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Encode a sentence. An empty result means the sentence can't be processed.
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, Error>;

    /// Current vocabulary size. Every id returned by [Tokenizer::encode] is below it.
    async fn vocabulary_size(&self) -> Result<usize, Error>;
}

