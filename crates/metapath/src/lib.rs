//! # metapath
//!
//! Node embeddings for heterogeneous graphs, learned by running skip-gram
//! with negative sampling over pre-generated random walks.
//!
//! ## Modules
//!
//! - **core**: Errors, `TrainConfig`, dense embedding tables, seed derivation
//! - **data**: Vocabulary, negative sampling tables, pair generation, batching
//! - **nn**: Skip-gram model with clipped log-sigmoid loss
//! - **optim**: Sparse Adam, cosine annealing
//! - **io**: Walk corpus, node types, config and embedding files
//! - **trainer**: The training loop
//! - **pipeline**: `Metapath2Vec`: corpus to embedding file

/// Errors, configuration and embedding storage.
pub use metapath_core as core;

/// Vocabulary, sampling and batching.
pub use metapath_data as data;

/// Skip-gram model.
pub use metapath_nn as nn;

/// Optimizer and learning-rate schedule.
pub use metapath_optim as optim;

/// File I/O.
pub use metapath_io as io;

pub mod pipeline;
pub mod trainer;

pub use metapath_core::{MetapathError, MetapathResult, TrainConfig};
pub use pipeline::Metapath2Vec;
pub use trainer::{Trainer, TrainerState, TrainingReport};
