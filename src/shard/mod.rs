/*! Shards

A shard holds the triplets of one chunk, as gzip-compressed JSON lines:

```text
{"center":12,"context":40,"negatives":[7,301,88]}
{"center":12,"context":9,"negatives":[1502,7,64]}
```

Shard names are `{run_id}_{chunk:05}_{timestamp}.jsonl.gz`. The run id tells runs apart,
the chunk index tells chunks of a run apart and the timestamp tells reruns with the
same run id apart.
!*/
use std::io::{BufRead, BufReader, Write};

use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::triplets::SgnsTriplet;

pub const EXTENSION: &str = "jsonl.gz";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

#[derive(Debug, Clone)]
pub struct ShardNamer {
    run_id: String,
}

impl ShardNamer {
    pub fn new(run_id: String) -> Self {
        Self { run_id }
    }

    /// Namer with a random UUID v4 as run id.
    pub fn random() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn name(&self, chunk: usize) -> String {
        format!(
            "{}_{:05}_{}.{}",
            self.run_id,
            chunk,
            Utc::now().format(TIMESTAMP_FORMAT),
            EXTENSION
        )
    }
}

/// Serialize triplets into a shard blob.
pub fn encode(triplets: &[SgnsTriplet]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for triplet in triplets {
        serde_json::to_writer(&mut encoder, triplet)?;
        encoder.write_all(b"\n")?;
    }
    Ok(encoder.finish()?)
}

/// Read back the triplets of a shard blob.
pub fn decode(data: &[u8]) -> Result<Vec<SgnsTriplet>, Error> {
    let reader = BufReader::new(GzDecoder::new(data));
    let mut triplets = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        triplets.push(serde_json::from_str(&line)?);
    }
    Ok(triplets)
}

/// Hex SHA-256 of a blob.
pub fn checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
