//! Interchangeable AEAD cipher suites with persistent key material
//!
//! Encrypted message format (binary):
//! ```text
//! [N bytes: random nonce][ciphertext][16 bytes: tag]
//! ```
//! where N is 12 for AES-GCM and ChaCha20-Poly1305, 24 for XChaCha20-Poly1305
//! and secretbox.
//!
//! Each suite owns one key for its whole lifetime. These are the persistent-key
//! counterpart to the per-value derived keys used by the envelope.

use aead::generic_array::typenum::Unsigned;
use aead::{Aead, AeadCore, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::aes::AesGcmSuite;
use crate::error::{CryptoError, CryptoResult};
use crate::poly1305::ChaCha20Poly1305Suite;
use crate::random;
use crate::secretbox::SecretBoxSuite;
use crate::xchacha::XChaCha20Poly1305Suite;

/// Every cipher suite the crate can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Aes128Gcm,
    Aes192Gcm,
    Aes256Gcm,
    #[serde(rename = "xchacha20-poly1305")]
    XChaCha20Poly1305,
    SecretBox,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Aes128Gcm => "aes-128-gcm",
            Algorithm::Aes192Gcm => "aes-192-gcm",
            Algorithm::Aes256Gcm => "aes-256-gcm",
            Algorithm::XChaCha20Poly1305 => "xchacha20-poly1305",
            Algorithm::SecretBox => "secretbox",
            Algorithm::ChaCha20Poly1305 => "chacha20-poly1305",
        }
    }

    pub fn key_size(self) -> usize {
        match self {
            Algorithm::Aes128Gcm => 16,
            Algorithm::Aes192Gcm => 24,
            _ => 32,
        }
    }

    pub fn nonce_size(self) -> usize {
        match self {
            Algorithm::XChaCha20Poly1305 | Algorithm::SecretBox => 24,
            _ => 12,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Encrypt/decrypt capability shared by all suites.
pub trait CipherSuite: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Seal `plaintext` under a fresh random nonce; the nonce leads the output.
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Open the output of [`CipherSuite::encrypt`]. Never returns partial plaintext.
    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Raw key bytes
    fn key_material(&self) -> &[u8];

    /// Lowercase hex of the raw key
    fn export_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.key_material()))
    }

    /// Persistable record of this suite's identity
    fn to_suite_key(&self) -> SuiteKey {
        SuiteKey {
            algorithm: self.algorithm(),
            key: self.export_hex().to_string(),
        }
    }
}

/// Serde form of a suite: algorithm name + hex key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SuiteKey {
    #[zeroize(skip)]
    pub algorithm: Algorithm,
    pub key: String,
}

impl std::fmt::Debug for SuiteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Build a suite with a freshly generated key.
pub fn generate(algorithm: Algorithm) -> CryptoResult<Box<dyn CipherSuite>> {
    let key = generate_key(algorithm.key_size())?;
    from_bytes(algorithm, &key)
}

/// Rebuild a suite from its persisted record.
pub fn from_key(key: &SuiteKey) -> CryptoResult<Box<dyn CipherSuite>> {
    let bytes = decode_key_hex(&key.key)?;
    let suite = from_bytes(key.algorithm, &bytes)?;
    if suite.algorithm() != key.algorithm {
        return Err(CryptoError::KeyLength {
            algorithm: key.algorithm.name(),
            len: bytes.len(),
        });
    }
    Ok(suite)
}

fn from_bytes(algorithm: Algorithm, key: &[u8]) -> CryptoResult<Box<dyn CipherSuite>> {
    Ok(match algorithm {
        Algorithm::Aes128Gcm | Algorithm::Aes192Gcm | Algorithm::Aes256Gcm => {
            Box::new(AesGcmSuite::from_bytes(key)?)
        }
        Algorithm::XChaCha20Poly1305 => Box::new(XChaCha20Poly1305Suite::from_bytes(key)?),
        Algorithm::SecretBox => Box::new(SecretBoxSuite::from_bytes(key)?),
        Algorithm::ChaCha20Poly1305 => Box::new(ChaCha20Poly1305Suite::from_bytes(key)?),
    })
}

/// Random key of `len` bytes, zeroized on drop.
pub(crate) fn generate_key(len: usize) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new(vec![0u8; len]);
    random::fill(&mut key)?;
    Ok(key)
}

pub(crate) fn decode_key_hex(s: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    hex::decode(s.trim())
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// Copy `key` into a fixed-size array, rejecting any other length.
pub(crate) fn fixed_key<const N: usize>(
    algorithm: Algorithm,
    key: &[u8],
) -> CryptoResult<Zeroizing<[u8; N]>> {
    let array: [u8; N] = key.try_into().map_err(|_| CryptoError::KeyLength {
        algorithm: algorithm.name(),
        len: key.len(),
    })?;
    Ok(Zeroizing::new(array))
}

/// `[nonce][ciphertext + tag]` under a random nonce.
pub(crate) fn seal_prefixed<A: Aead>(cipher: &A, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut nonce = Nonce::<A>::default();
    random::fill(&mut nonce)?;

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Encrypt)?;

    let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`seal_prefixed`].
pub(crate) fn open_prefixed<A: Aead>(cipher: &A, message: &[u8]) -> CryptoResult<Vec<u8>> {
    let nonce_size = <A as AeadCore>::NonceSize::USIZE;
    let tag_size = <A as AeadCore>::TagSize::USIZE;
    if message.len() < nonce_size + tag_size {
        return Err(CryptoError::Decrypt);
    }

    let (nonce, ciphertext) = message.split_at(nonce_size);
    cipher
        .decrypt(Nonce::<A>::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}
