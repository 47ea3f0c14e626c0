use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("backend does not support {0}")]
    Unsupported(&'static str),

    #[error("version mismatch for key {key}")]
    VersionMismatch { key: String },

    #[error("backend is closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
