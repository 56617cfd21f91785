//! # polyvec
//!
//! Generates skip-gram with negative sampling training triplets from a multilingual corpus.
//!
//! ## Getting started
//!
//! ```sh
//! polyvec 0.1.0
//! SGNS training triplet generation.
//!
//! USAGE:
//!     polyvec <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     help    Prints this message or the help of the given subcommand(s)
//!     list    List generated shards
//!     run     Generate triplet shards from a corpus range
//! ```
//!
//! Logging is configured through `RUST_LOG`, e.g. `RUST_LOG=polyvec=info`.
use polyvec::error::Error;
use polyvec::pipeline::{Pipeline, SgnsPipeline, VocabSource};
use polyvec::storage::{LocalStorage, ShardSink};
use polyvec::tokenizer::HttpTokenizer;
use structopt::StructOpt;

#[macro_use]
extern crate log;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Polyvec::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Polyvec::Run(r) => {
            let config = r.pipeline_config()?;
            let tokenizer = HttpTokenizer::new(&r.tokenizer)?;
            let vocab_source = match &r.merges {
                Some(path) => VocabSource::Merges(path.clone()),
                None => VocabSource::Tokenizer,
            };

            let p = SgnsPipeline::new(
                tokenizer,
                LocalStorage::new(&r.corpus),
                LocalStorage::new(&r.shards),
                r.range(),
                config,
            )?
            .vocab_source(vocab_source);

            match p.run() {
                Ok(summary) => {
                    println!("{}", summary);
                    for shard in &summary.shards {
                        println!(
                            "{}\t{}\t{}",
                            shard.name,
                            shard.size,
                            shard.checksum.as_deref().unwrap_or("-")
                        );
                    }
                }
                Err(e) => {
                    error!("run failed: {}", e);
                    return Err(e);
                }
            }
        }

        cli::Polyvec::List(l) => {
            let shards = LocalStorage::new(&l.shards).list()?;
            for shard in &shards {
                println!("{}\t{}", shard.name, shard.size);
            }
            info!("{} shards in {:?}", shards.len(), l.shards);
        }
    };
    Ok(())
}
