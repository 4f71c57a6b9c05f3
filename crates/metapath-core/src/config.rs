use crate::error::{MetapathError, MetapathResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hyperparameters and paths for one training run.
///
/// Missing fields take their defaults when deserialized, so a JSON config
/// only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Walk corpus location.
    pub path: PathBuf,
    /// Optional `token,type` metadata; token prefixes are used without it.
    pub node_types: Option<PathBuf>,
    pub min_count: usize,
    /// 0 draws negatives from one global table, anything else restricts
    /// them to the context node's type.
    pub care_type: u32,
    pub window_size: usize,
    pub batch_size: usize,
    pub worker_count: usize,
    /// Collated batches buffered per worker before producers block.
    pub prefetch: usize,
    pub embedding_dim: usize,
    pub iterations: usize,
    pub initial_lr: f64,
    pub negatives: usize,
    pub subsample_threshold: f64,
    pub table_size: usize,
    pub seed: u64,
    pub log_every: usize,
    pub output_path: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            path: PathBuf::from("data"),
            node_types: None,
            min_count: 5,
            care_type: 0,
            window_size: 5,
            batch_size: 50,
            worker_count: 3,
            prefetch: 2,
            embedding_dim: 128,
            iterations: 15,
            initial_lr: 0.02,
            negatives: 5,
            subsample_threshold: 1e-3,
            table_size: 100_000_000,
            seed: 42,
            log_every: 500,
            output_path: PathBuf::from("data.embedding"),
        }
    }
}

impl TrainConfig {
    pub fn typed_negatives(&self) -> bool {
        self.care_type != 0
    }

    /// Reject option combinations that cannot train.
    pub fn validate(&self) -> MetapathResult<()> {
        let positive = [
            ("min_count", self.min_count),
            ("window_size", self.window_size),
            ("batch_size", self.batch_size),
            ("embedding_dim", self.embedding_dim),
            ("iterations", self.iterations),
            ("negatives", self.negatives),
            ("table_size", self.table_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(MetapathError::config(format!("{} must be at least 1", name)));
            }
        }
        if !self.initial_lr.is_finite() || self.initial_lr <= 0.0 {
            return Err(MetapathError::config(format!(
                "initial_lr must be a positive number, got {}",
                self.initial_lr
            )));
        }
        if !self.subsample_threshold.is_finite() || self.subsample_threshold <= 0.0 {
            return Err(MetapathError::config(format!(
                "subsample_threshold must be a positive number, got {}",
                self.subsample_threshold
            )));
        }
        Ok(())
    }
}
