pub mod collate;
pub mod dataloader;
pub mod dataset;
pub mod pairs;
pub mod sampling;
pub mod vocab;

pub use collate::{Batch, Collator};
pub use dataloader::WalkLoader;
pub use dataset::{Dataset, EncodedWalks, WalkDataset};
pub use pairs::{PairGenerator, Pairs};
pub use sampling::{NegativeSampler, SamplingTable};
pub use vocab::{NodeType, NodeTyping, TypeIndex, Vocabulary, VocabularyBuilder, Walk};
