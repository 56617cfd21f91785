//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use polyvec::config::PipelineConfig;
use polyvec::error::Error;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "polyvec", about = "SGNS training triplet generation.")]
/// Holds every command that is callable by the `polyvec` command.
pub enum Polyvec {
    #[structopt(about = "Generate triplet shards from a corpus range")]
    Run(Run),
    #[structopt(about = "List generated shards")]
    List(List),
}

#[derive(Debug, StructOpt)]
/// Run command and parameters.
///
/// Options given on the command line override the ones of the configuration file.
pub struct Run {
    #[structopt(parse(from_os_str), help = "corpus location (JSON objects)")]
    pub corpus: PathBuf,
    #[structopt(parse(from_os_str), help = "shards destination")]
    pub shards: PathBuf,
    #[structopt(
        long = "start",
        default_value = "0",
        help = "index of the first corpus object (sorted keys)"
    )]
    pub start: usize,
    #[structopt(
        long = "end",
        help = "index after the last corpus object. Default is the end of the corpus."
    )]
    pub end: Option<usize>,
    #[structopt(
        long = "tokenizer",
        default_value = "http://localhost:8080/",
        help = "tokenizer service base url"
    )]
    pub tokenizer: String,
    #[structopt(
        long = "merges",
        parse(from_os_str),
        help = "merges artifact to read the vocabulary size from, instead of asking the tokenizer"
    )]
    pub merges: Option<PathBuf>,
    #[structopt(long = "config", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(short = "w", long = "window", help = "window size. Default is 5.")]
    pub window_size: Option<usize>,
    #[structopt(
        short = "k",
        long = "negatives",
        help = "negatives per triplet. Default is 15."
    )]
    pub negatives: Option<usize>,
    #[structopt(
        short = "s",
        long = "chunk-size",
        help = "token sequences per shard. Default is 10000."
    )]
    pub chunk_size: Option<usize>,
    #[structopt(long = "seed", help = "seed of the negative sampling")]
    pub seed: Option<u64>,
    #[structopt(long = "run-id", help = "shard name prefix. Default is a random UUID.")]
    pub run_id: Option<String>,
    #[structopt(long = "no-shuffle", help = "keep triplets in sentence order in shards")]
    pub no_shuffle: bool,
}

impl Run {
    /// Configuration file (or defaults) overridden by command line options.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, Error> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_path(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(window_size) = self.window_size {
            config.window_size = window_size;
        }
        if let Some(negatives) = self.negatives {
            config.negatives = negatives;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.run_id.is_some() {
            config.run_id = self.run_id.clone();
        }
        if self.no_shuffle {
            config.shuffle = false;
        }

        Ok(config)
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end.unwrap_or(usize::MAX)
    }
}

#[derive(Debug, StructOpt)]
/// List command and parameters.
pub struct List {
    #[structopt(parse(from_os_str), help = "shards location")]
    pub shards: PathBuf,
}
