pub mod config;
pub mod corpus;
pub mod embedding;

pub use config::{load_config, save_config};
pub use corpus::{read_node_types, read_walks};
pub use embedding::{read_embeddings, write_embeddings, Embeddings};
