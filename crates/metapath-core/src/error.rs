use thiserror::Error;

/// A walk the corpus handed over that cannot be turned into training pairs.
///
/// Recoverable: the loader logs the walk and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorpusError {
    #[error("Walk {index} is empty")]
    EmptyWalk { index: usize },

    #[error("Walk {index} contains token {token:?} unknown to the vocabulary")]
    UnresolvedToken { index: usize, token: String },
}

/// Core error type for the embedding pipeline.
#[derive(Debug, Error)]
pub enum MetapathError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed embedding file at line {line}: {message}")]
    Format { line: usize, message: String },
}

impl MetapathError {
    pub fn config(msg: impl Into<String>) -> Self {
        MetapathError::Configuration(msg.into())
    }
}

pub type MetapathResult<T> = Result<T, MetapathError>;
