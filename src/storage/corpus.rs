//! Sentence loading from a corpus source.
//!
//! Each corpus object is a JSON object mapping a language label to its sentences:
//!
//! ```json
//! { "en": ["a sentence", "another one"], "fr": ["une phrase"] }
//! ```
use std::ops::Range;

use log::{error, info};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::storage::CorpusSource;

/// Sentences of the objects `range` selects among the lexicographically sorted keys.
///
/// Sentences are flattened in key order, then in object order (languages as they appear,
/// sentences in list order). `range.end` is clipped to the number of objects.
/// Objects that aren't valid corpus JSON are logged and skipped; objects that can't be
/// fetched fail the whole load.
pub fn load_sentences<S>(source: &S, range: Range<usize>) -> Result<Vec<String>, Error>
where
    S: CorpusSource + ?Sized,
{
    if range.start > range.end {
        return Err(Error::Config(format!(
            "invalid corpus range [{}, {})",
            range.start, range.end
        )));
    }

    let mut keys = source.keys()?;
    keys.sort();

    let end = range.end.min(keys.len());
    let start = range.start.min(end);
    let selected = &keys[start..end];
    info!(
        "loading objects [{}, {}) out of {} ({} selected)",
        start,
        end,
        keys.len(),
        selected.len()
    );

    let mut sentences = Vec::new();
    for key in selected {
        let content = source.fetch(key)?;
        match parse_object(&content) {
            Ok(mut object_sentences) => {
                info!("{}: {} sentences", key, object_sentences.len());
                sentences.append(&mut object_sentences);
            }
            Err(e) => error!("skipping {}: not a corpus object: {}", key, e),
        }
    }

    Ok(sentences)
}

fn parse_object(content: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_slice(content)?;
    let mut sentences = Vec::new();
    for (_lang, value) in object {
        let mut lang_sentences: Vec<String> = serde_json::from_value(value)?;
        sentences.append(&mut lang_sentences);
    }
    Ok(sentences)
}
