pub mod loss;
pub mod skipgram;

pub use loss::{log_sigmoid, pair_loss, sigmoid, SCORE_CLIP};
pub use skipgram::{Forward, Gradients, SkipGram};
