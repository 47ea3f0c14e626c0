use thiserror::Error;

use crate::DERIVATION_NONCE_SIZE;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures raised by the cipher suites, key derivation and the envelope.
///
/// Messages name what failed and never include key or plaintext material.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secure random source failed: {0}")]
    RandomSource(String),

    #[error("invalid key length for {algorithm}: {len} bytes")]
    KeyLength { algorithm: &'static str, len: usize },

    #[error("invalid key encoding: {0}")]
    KeyEncoding(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: invalid key or corrupted data")]
    Decrypt,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("envelope truncated: {len} bytes (minimum {DERIVATION_NONCE_SIZE})")]
    Truncated { len: usize },

    #[error("envelope decryption failed: {0}")]
    EnvelopeDecrypt(String),

    #[error("envelope sealing failed: {0}")]
    EnvelopeSeal(String),

    #[error(transparent)]
    Config(#[from] sealkv_core::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// Wrap into an `io::Error` so it can cross a `Read`/`Write` boundary.
    pub(crate) fn into_io(self) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, self)
    }

    /// Recover a `CryptoError` that was wrapped by [`CryptoError::into_io`].
    pub fn from_io(err: std::io::Error) -> Self {
        let wrapped = err
            .get_ref()
            .is_some_and(|inner| inner.is::<CryptoError>());
        if !wrapped {
            return CryptoError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<CryptoError>()) {
            Some(Ok(crypto)) => *crypto,
            _ => CryptoError::EnvelopeDecrypt("malformed stream error".into()),
        }
    }
}
