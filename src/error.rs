use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankError>;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RankError {
    /// Wraps a backend failure so it crosses the port boundary unchanged.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        RankError::Storage(err.to_string())
    }
}
