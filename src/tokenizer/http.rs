use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde::Deserialize;

use crate::error::Error;
use crate::tokenizer::Tokenizer;
use crate::TokenId;

#[derive(Debug, Deserialize)]
struct EncodeResponse {
    // any JSON number, so that bad ids are told apart from transport errors
    tokens: Vec<serde_json::Number>,
}

fn token_id(n: &serde_json::Number) -> Result<TokenId, Error> {
    n.as_u64()
        .and_then(|id| TokenId::try_from(id).ok())
        .ok_or_else(|| Error::InvalidTokenId(n.to_string()))
}

#[derive(Debug, Deserialize)]
struct VocabularySizeResponse {
    vocabulary_size: usize,
}

/// Client of the HTTP tokenizer service.
///
/// The inner [reqwest::Client] is shared by every concurrent request.
#[derive(Debug, Clone)]
pub struct HttpTokenizer {
    encode_url: Url,
    vocabulary_size_url: Url,
    client: reqwest::Client,
}

impl HttpTokenizer {
    pub fn new(base: &str) -> Result<Self, Error> {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(base: &str, client: reqwest::Client) -> Result<Self, Error> {
        // without a trailing slash, join would replace the last path segment
        let base = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{}/", base))?
        };

        Ok(Self {
            encode_url: base.join("encode")?,
            vocabulary_size_url: base.join("vocabulary-size")?,
            client,
        })
    }

    pub fn encode_url(&self) -> &Url {
        &self.encode_url
    }
}

#[async_trait]
impl Tokenizer for HttpTokenizer {
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, Error> {
        debug!("POST {} ({} bytes)", self.encode_url, sentence.len());
        let resp: EncodeResponse = self
            .client
            .post(self.encode_url.clone())
            .json(sentence)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.tokens.iter().map(token_id).collect()
    }

    async fn vocabulary_size(&self) -> Result<usize, Error> {
        debug!("GET {}", self.vocabulary_size_url);
        let resp: VocabularySizeResponse = self
            .client
            .get(self.vocabulary_size_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.vocabulary_size)
    }
}
