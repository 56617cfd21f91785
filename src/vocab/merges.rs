//! Vocabulary size from a persisted BPE merges artifact.
//!
//! The artifact is the JSON file written by the tokenizer trainer:
//!
//! ```json
//! { "merges": { "104,101": 256, "256,108": 257 } }
//! ```
//!
//! Every merge assigns a new id; the vocabulary size is one more than the highest one.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct MergesFile {
    merges: Map<String, Value>,
}

/// Read the merges artifact at `path` and derive the vocabulary size.
///
/// Returns [None] if the file can't be read, isn't a merges artifact, or holds no merge.
/// Callers must treat this as "vocabulary unknown".
pub fn vocab_size_from_merges(path: &Path) -> Option<usize> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("could not open merges artifact {:?}: {}", path, e);
            return None;
        }
    };

    let merges: MergesFile = match serde_json::from_reader(BufReader::new(file)) {
        Ok(m) => m,
        Err(e) => {
            warn!("could not parse merges artifact {:?}: {}", path, e);
            return None;
        }
    };

    let mut highest: Option<u64> = None;
    for (pair, id) in &merges.merges {
        match id.as_u64() {
            Some(id) => highest = highest.max(Some(id)),
            None => {
                warn!("merge {:?} has a non-integer id {}", pair, id);
                return None;
            }
        }
    }

    let size = highest.map(|h| h as usize + 1);
    debug!("merges artifact {:?}: vocabulary size {:?}", path, size);
    size
}
