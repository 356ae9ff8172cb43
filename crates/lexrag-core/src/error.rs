use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query or batch vectors do not match the index dimensionality.
    #[error("Dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted artifacts disagree with each other.
    #[error("Index corrupt: {0}")]
    Corrupt(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Configuration and build errors are never retried by callers.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_) | Error::DimensionMismatch { .. } | Error::Build(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
