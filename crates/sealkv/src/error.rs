use sealkv_codec::CodecError;
use sealkv_core::ConfigError;
use sealkv_crypto::CryptoError;
use sealkv_storage::BackendError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secure random source failed: {0}")]
    RandomSource(String),

    #[error("invalid key length for {algorithm}: {len} bytes")]
    KeyLength { algorithm: &'static str, len: usize },

    #[error("envelope truncated: {len} bytes")]
    Truncated { len: usize },

    #[error("envelope decryption failed: {0}")]
    EnvelopeDecrypt(String),

    #[error("envelope sealing failed: {0}")]
    EnvelopeSeal(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("output value is absent")]
    NilOutput,

    #[error("list output must be a present vector")]
    InvalidOutput,

    #[error("store is closed")]
    Closed,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<CryptoError> for StoreError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::RandomSource(msg) => StoreError::RandomSource(msg),
            CryptoError::KeyLength { algorithm, len } => StoreError::KeyLength { algorithm, len },
            CryptoError::KeyEncoding(msg) => StoreError::Config(ConfigError::Invalid(msg)),
            CryptoError::Truncated { len } => StoreError::Truncated { len },
            CryptoError::Decrypt => StoreError::EnvelopeDecrypt(err.to_string()),
            CryptoError::EnvelopeDecrypt(msg) => StoreError::EnvelopeDecrypt(msg),
            CryptoError::Encrypt | CryptoError::KeyDerivation => {
                StoreError::EnvelopeSeal(err.to_string())
            }
            CryptoError::EnvelopeSeal(msg) => StoreError::EnvelopeSeal(msg),
            CryptoError::Config(e) => StoreError::Config(e),
            CryptoError::Io(e) => StoreError::EnvelopeSeal(e.to_string()),
        }
    }
}

impl StoreError {
    /// Map a codec failure on the write path. Sink errors come from the
    /// envelope writer and keep their envelope meaning.
    pub(crate) fn encoding(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => CryptoError::from_io(e).into(),
            other => StoreError::Serialization(other.to_string()),
        }
    }

    pub(crate) fn decoding(err: CodecError) -> Self {
        StoreError::Deserialization(err.to_string())
    }

    /// Map a backend read failure, turning an absent key into `KeyNotFound`.
    pub(crate) fn reading(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(key) => StoreError::KeyNotFound(key),
            other => StoreError::Backend(other),
        }
    }
}
