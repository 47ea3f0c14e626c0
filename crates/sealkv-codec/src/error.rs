use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("type {0} is not registered with the binary codec")]
    Unregistered(&'static str),

    #[error("type name {0:?} is registered twice")]
    DuplicateName(String),

    /// The sink or source failed; carries the underlying error unchanged.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn ser(err: impl std::fmt::Display) -> Self {
        CodecError::Serialization(err.to_string())
    }

    pub(crate) fn de(err: impl std::fmt::Display) -> Self {
        CodecError::Deserialization(err.to_string())
    }
}
