pub mod config;
pub mod embedding;
pub mod error;
pub mod grad;
pub mod rng;

pub use config::TrainConfig;
pub use embedding::EmbeddingTable;
pub use error::{CorpusError, MetapathError, MetapathResult};
pub use grad::SparseGrad;
pub use rng::{derive_seed, stream_rng};
