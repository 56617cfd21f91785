use std::path::Path;

use async_trait::async_trait;
use polyvec::config::PipelineConfig;
use polyvec::error::Error;
use polyvec::pipeline::{Pipeline, RunSummary, SgnsPipeline, VocabSource};
use polyvec::shard;
use polyvec::storage::{LocalStorage, ShardSink};
use polyvec::tokenizer::{RetryPolicy, Tokenizer};
use polyvec::triplets::{SgnsTriplet, WindowExtractor};
use polyvec::TokenId;

const WORDS: [&str; 16] = [
    "the", "a", "cat", "dog", "sat", "ran", "on", "under", "mat", "table", "le", "chat", "sur",
    "la", "der", "hund",
];

/// Whitespace tokenizer over [WORDS]. Sentences containing "unreachable" never get through.
struct WordTokenizer {
    vocabulary_size: usize,
}

impl WordTokenizer {
    fn new(vocabulary_size: usize) -> Self {
        Self { vocabulary_size }
    }

    fn id(word: &str) -> Option<TokenId> {
        WORDS.iter().position(|w| *w == word).map(|p| p as TokenId)
    }
}

#[async_trait]
impl Tokenizer for WordTokenizer {
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, Error> {
        if sentence.contains("unreachable") {
            return Err(Error::Tokenizer("503 Service Unavailable".to_string()));
        }
        Ok(sentence.split_whitespace().filter_map(Self::id).collect())
    }

    async fn vocabulary_size(&self) -> Result<usize, Error> {
        Ok(self.vocabulary_size)
    }
}

fn write_corpus(dir: &Path) {
    std::fs::write(
        dir.join("000.json"),
        r#"{
            "en": ["the cat sat on the mat", "a dog ran under the table", "tokenizer unreachable here"],
            "fr": ["le chat sur la table"]
        }"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("001.json"),
        r#"{"de": ["der hund", "xyz"], "en": ["the dog sat on a cat"]}"#,
    )
    .unwrap();
    std::fs::write(dir.join("002.json"), r#"{"en": ["the table"]}"#).unwrap();
}

fn config(seed: u64) -> PipelineConfig {
    PipelineConfig {
        window_size: 4,
        negatives: 3,
        chunk_size: 2,
        retry: RetryPolicy {
            max_attempts: 3,
            delay_ms: 1,
            exponential: false,
        },
        seed: Some(seed),
        run_id: Some("it".to_string()),
        ..Default::default()
    }
}

fn run(corpus: &Path, shards: &Path, range: std::ops::Range<usize>, seed: u64) -> RunSummary {
    SgnsPipeline::new(
        WordTokenizer::new(WORDS.len()),
        LocalStorage::new(corpus),
        LocalStorage::new(shards),
        range,
        config(seed),
    )
    .unwrap()
    .run()
    .unwrap()
}

fn read_all(shards: &Path) -> Vec<SgnsTriplet> {
    let storage = LocalStorage::new(shards);
    storage
        .list()
        .unwrap()
        .iter()
        .flat_map(|e| shard::decode(&std::fs::read(shards.join(&e.name)).unwrap()).unwrap())
        .collect()
}

#[test_log::test]
fn corpus_to_shards() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let summary = run(corpus.path(), shards.path(), 0..2, 1);

    // 7 sentences in the first two objects: one unreachable, "xyz" has no known word
    assert_eq!(summary.sentences, 7);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unprocessable, 1);
    assert_eq!(summary.sequences, 5);
    assert_eq!(summary.vocab_size, WORDS.len());
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.shards.len(), 3);

    let listed = LocalStorage::new(shards.path()).list().unwrap();
    assert_eq!(listed.len(), 3);
    for (entry, published) in listed.iter().zip(&summary.shards) {
        assert_eq!(entry.name, published.name);
        assert_eq!(entry.size, published.size);
        assert!(entry.name.starts_with("it_0000"));
    }

    let extractor = WindowExtractor::new(4, 3);
    let expected: usize = [
        "the cat sat on the mat",
        "a dog ran under the table",
        "le chat sur la table",
        "der hund",
        "the dog sat on a cat",
    ]
    .iter()
    .map(|s| {
        let tokens: Vec<TokenId> = s.split_whitespace().filter_map(WordTokenizer::id).collect();
        extractor.pairs(&tokens).len()
    })
    .sum();

    let triplets = read_all(shards.path());
    assert_eq!(summary.triplets, expected);
    assert_eq!(triplets.len(), expected);
    for t in &triplets {
        assert_eq!(t.negatives.len(), 3);
        assert!(!t.negatives.contains(&t.center));
        assert!(!t.negatives.contains(&t.context));
        assert!(t.negatives.iter().all(|&n| (n as usize) < WORDS.len()));
    }
}

#[test]
fn reruns_keep_structure() {
    let corpus = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let pairs = |seed| {
        let shards = tempfile::tempdir().unwrap();
        run(corpus.path(), shards.path(), 0..3, seed);
        let mut pairs: Vec<_> = read_all(shards.path()).iter().map(|t| t.pair()).collect();
        pairs.sort();
        pairs
    };

    let a = pairs(1);
    let b = pairs(2);
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn dropped_sentences_leave_no_trace() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    std::fs::write(
        corpus.path().join("0.json"),
        r#"{"en": ["hund unreachable der", "the cat sat on the mat under a table"]}"#,
    )
    .unwrap();

    let tokenizer = WordTokenizer::new(WORDS.len());
    let pipeline = SgnsPipeline::new(
        tokenizer,
        LocalStorage::new(corpus.path()),
        LocalStorage::new(shards.path()),
        0..1,
        config(5),
    )
    .unwrap();
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sequences, 1);
    // only the second sentence was counted
    assert_eq!(summary.tokens, 9);

    let hund = WordTokenizer::id("hund").unwrap();
    let der = WordTokenizer::id("der").unwrap();
    for t in read_all(shards.path()) {
        assert!(t.center != hund && t.center != der);
        assert!(t.context != hund && t.context != der);
        // never observed, so never sampled either
        assert!(!t.negatives.contains(&hund) && !t.negatives.contains(&der));
    }
}

#[test]
fn out_of_range_token_is_fatal() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    // "table" is id 9
    let res = SgnsPipeline::new(
        WordTokenizer::new(9),
        LocalStorage::new(corpus.path()),
        LocalStorage::new(shards.path()),
        0..3,
        config(0),
    )
    .unwrap()
    .run();

    assert!(matches!(res, Err(Error::TokenOutOfRange { .. })));
    assert!(LocalStorage::new(shards.path()).list().unwrap().is_empty());
}

#[test]
fn vocabulary_from_merges() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    let artifacts = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let merges = artifacts.path().join("merges.json");
    std::fs::write(&merges, r#"{"merges": {"104,101": 20, "20,108": 31}}"#).unwrap();

    let pipeline = |vocab_source| {
        SgnsPipeline::new(
            WordTokenizer::new(0),
            LocalStorage::new(corpus.path()),
            LocalStorage::new(shards.path()),
            0..3,
            config(0),
        )
        .unwrap()
        .vocab_source(vocab_source)
    };

    let summary = pipeline(VocabSource::Merges(merges)).run().unwrap();
    assert_eq!(summary.vocab_size, 32);

    let missing = artifacts.path().join("missing.json");
    assert!(matches!(
        pipeline(VocabSource::Merges(missing)).run(),
        Err(Error::VocabularyUnknown(_))
    ));
}

#[test]
fn window_larger_than_vocabulary() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let res = SgnsPipeline::new(
        WordTokenizer::new(WORDS.len()),
        LocalStorage::new(corpus.path()),
        LocalStorage::new(shards.path()),
        0..3,
        PipelineConfig {
            window_size: 20,
            ..config(0)
        },
    )
    .unwrap()
    .run();
    assert!(matches!(res, Err(Error::VocabularyTooSmall { .. })));
}

#[test]
fn empty_range() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let summary = run(corpus.path(), shards.path(), 3..3, 0);
    assert_eq!(summary.sentences, 0);
    assert_eq!(summary.chunks, 0);
    assert!(summary.shards.is_empty());
}

#[test]
fn exclusion_covering_every_seen_token_is_fatal() {
    // sentences tokenized as [1, 2, 3], [2, 3], [1] with a vocabulary of 4 and a window of 2:
    // the center of [1, 2, 3] forbids 1, 2 and 3, the only tokens with a non-zero probability.
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    std::fs::write(
        corpus.path().join("0.json"),
        r#"{"en": ["a cat dog", "cat dog", "a"]}"#,
    )
    .unwrap();

    let res = SgnsPipeline::new(
        WordTokenizer::new(4),
        LocalStorage::new(corpus.path()),
        LocalStorage::new(shards.path()),
        0..1,
        PipelineConfig {
            window_size: 2,
            negatives: 1,
            chunk_size: 10,
            ..config(0)
        },
    )
    .unwrap()
    .run();

    match res {
        Err(Error::ChunkFailures(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].chunk, 0);
            assert!(matches!(
                failures[0].error,
                Error::VocabularyTooSmall { vocab_size: 4, .. }
            ));
        }
        other => panic!("expected a chunk failure, got {:?}", other),
    }
}

#[test]
fn invalid_config_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let res = SgnsPipeline::new(
        WordTokenizer::new(4),
        LocalStorage::new(dir.path()),
        LocalStorage::new(dir.path()),
        0..1,
        PipelineConfig {
            chunk_size: 0,
            ..Default::default()
        },
    );
    assert!(matches!(res, Err(Error::Config(_))));
}

/// [WordTokenizer] answering after a delay that depends on the sentence, fast or slow first.
/// `"bogus"` is answered with an id that doesn't fit a token id.
struct JitteryTokenizer {
    inner: WordTokenizer,
    short_first: bool,
}

#[async_trait]
impl Tokenizer for JitteryTokenizer {
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, Error> {
        if sentence.contains("bogus") {
            return Err(Error::InvalidTokenId("-7".to_string()));
        }
        let len = sentence.len() as u64 % 30;
        let wait = if self.short_first { len } else { 30 - len };
        tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
        self.inner.encode(sentence).await
    }

    async fn vocabulary_size(&self) -> Result<usize, Error> {
        self.inner.vocabulary_size().await
    }
}

fn jittery_run(corpus: &Path, short_first: bool, config: PipelineConfig) -> Vec<Vec<SgnsTriplet>> {
    let shards = tempfile::tempdir().unwrap();
    let tokenizer = JitteryTokenizer {
        inner: WordTokenizer::new(WORDS.len()),
        short_first,
    };
    SgnsPipeline::new(
        tokenizer,
        LocalStorage::new(corpus),
        LocalStorage::new(shards.path()),
        0..3,
        config,
    )
    .unwrap()
    .run()
    .unwrap();

    LocalStorage::new(shards.path())
        .list()
        .unwrap()
        .iter()
        .map(|e| shard::decode(&std::fs::read(shards.path().join(&e.name)).unwrap()).unwrap())
        .collect()
}

#[test]
fn same_seed_same_shards_whatever_the_tokenizer_latency() {
    let corpus = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let a = jittery_run(corpus.path(), true, config(11));
    let b = jittery_run(corpus.path(), false, config(11));
    assert_eq!(a.len(), 3);
    assert_eq!(a, b);
}

#[test]
fn unshuffled_shards_follow_the_corpus() {
    let corpus = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());

    let triplets = jittery_run(
        corpus.path(),
        false,
        PipelineConfig {
            shuffle: false,
            ..config(2)
        },
    );
    let pairs: Vec<_> = triplets.iter().flatten().map(|t| t.pair()).collect();

    let extractor = WindowExtractor::new(4, 3);
    let expected: Vec<_> = [
        "the cat sat on the mat",
        "a dog ran under the table",
        "le chat sur la table",
        "der hund",
        "the dog sat on a cat",
        "the table",
    ]
    .iter()
    .flat_map(|s| {
        let tokens: Vec<TokenId> = s.split_whitespace().filter_map(WordTokenizer::id).collect();
        extractor.pairs(&tokens)
    })
    .collect();
    assert_eq!(pairs, expected);
}

#[test]
fn invalid_token_id_stops_the_run() {
    let corpus = tempfile::tempdir().unwrap();
    let shards = tempfile::tempdir().unwrap();
    write_corpus(corpus.path());
    std::fs::write(corpus.path().join("003.json"), r#"{"en": ["a bogus answer"]}"#).unwrap();

    let res = SgnsPipeline::new(
        JitteryTokenizer {
            inner: WordTokenizer::new(WORDS.len()),
            short_first: true,
        },
        LocalStorage::new(corpus.path()),
        LocalStorage::new(shards.path()),
        0..4,
        config(0),
    )
    .unwrap()
    .run();

    assert!(matches!(res, Err(Error::InvalidTokenId(_))));
    assert!(LocalStorage::new(shards.path()).list().unwrap().is_empty());
}
