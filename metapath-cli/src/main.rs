//! `metapath2vec`: train node embeddings from a walk corpus.
//!
//! Options come from an optional JSON config file; any flag given on the
//! command line overrides the file. Exit code 1 on any error.

use clap::Parser;
use metapath::io::load_config;
use metapath::{Metapath2Vec, MetapathResult, TrainConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "metapath2vec")]
#[command(version)]
#[command(about = "Train metapath2vec skip-gram embeddings over heterogeneous graph walks")]
struct Cli {
    /// JSON file with training options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Walk corpus, one whitespace-separated walk per line
    #[arg(long)]
    path: Option<PathBuf>,

    /// `token,type` CSV used for type-constrained negatives
    #[arg(long)]
    node_types: Option<PathBuf>,

    /// Where to write the embedding file
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    min_count: Option<usize>,

    /// Non-zero restricts negatives to the context node's type
    #[arg(long)]
    care_type: Option<u32>,

    #[arg(long)]
    window_size: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Batch preparation threads (0 = on the training thread)
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    dim: Option<usize>,

    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    initial_lr: Option<f64>,

    /// Negatives per positive pair
    #[arg(long)]
    negatives: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> MetapathResult<TrainConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => TrainConfig::default(),
        };
        if let Some(v) = self.path { cfg.path = v; }
        if let Some(v) = self.node_types { cfg.node_types = Some(v); }
        if let Some(v) = self.output { cfg.output_path = v; }
        if let Some(v) = self.min_count { cfg.min_count = v; }
        if let Some(v) = self.care_type { cfg.care_type = v; }
        if let Some(v) = self.window_size { cfg.window_size = v; }
        if let Some(v) = self.batch_size { cfg.batch_size = v; }
        if let Some(v) = self.workers { cfg.worker_count = v; }
        if let Some(v) = self.dim { cfg.embedding_dim = v; }
        if let Some(v) = self.iterations { cfg.iterations = v; }
        if let Some(v) = self.initial_lr { cfg.initial_lr = v; }
        if let Some(v) = self.negatives { cfg.negatives = v; }
        if let Some(v) = self.seed { cfg.seed = v; }
        Ok(cfg)
    }
}

fn run(cli: Cli) -> MetapathResult<()> {
    let cfg = cli.into_config()?;
    let report = Metapath2Vec::from_config(cfg)?.train()?;
    info!(
        steps = report.steps,
        skipped_batches = report.skipped_batches,
        skipped_walks = report.skipped_walks,
        running_loss = report.running_loss,
        "training finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["metapath2vec", "--path", "walks.txt", "--dim", "32", "--care-type", "1"]);
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.path, PathBuf::from("walks.txt"));
        assert_eq!(cfg.embedding_dim, 32);
        assert!(cfg.typed_negatives());
        assert_eq!(cfg.window_size, TrainConfig::default().window_size);
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::parse_from(["metapath2vec", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
