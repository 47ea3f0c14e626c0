//! AES-GCM suite (128/192/256-bit keys, 96-bit nonce)

use aead::consts::U12;
use aead::{Key, KeyInit};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::suite::{self, decode_key_hex, generate_key, Algorithm, CipherSuite};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES key sizes accepted by the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesKeySize {
    Aes128 = 16,
    Aes192 = 24,
    Aes256 = 32,
}

impl AesKeySize {
    fn from_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(AesKeySize::Aes128),
            24 => Some(AesKeySize::Aes192),
            32 => Some(AesKeySize::Aes256),
            _ => None,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            AesKeySize::Aes128 => Algorithm::Aes128Gcm,
            AesKeySize::Aes192 => Algorithm::Aes192Gcm,
            AesKeySize::Aes256 => Algorithm::Aes256Gcm,
        }
    }
}

/// AES-GCM with a persistent key. Key size is fixed at construction.
pub struct AesGcmSuite {
    size: AesKeySize,
    key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for AesGcmSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmSuite")
            .field("size", &self.size)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AesGcmSuite {
    /// Generate a random key of the given size.
    pub fn generate(size: AesKeySize) -> CryptoResult<Self> {
        Ok(Self {
            size,
            key: generate_key(size as usize)?,
        })
    }

    /// Import a raw key; the key size follows from its length.
    pub fn from_bytes(key: &[u8]) -> CryptoResult<Self> {
        let size = AesKeySize::from_len(key.len()).ok_or(CryptoError::KeyLength {
            algorithm: "aes-gcm",
            len: key.len(),
        })?;
        Ok(Self {
            size,
            key: Zeroizing::new(key.to_vec()),
        })
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        Self::from_bytes(&decode_key_hex(s)?)
    }

    pub fn key_size(&self) -> AesKeySize {
        self.size
    }
}

impl CipherSuite for AesGcmSuite {
    fn algorithm(&self) -> Algorithm {
        self.size.algorithm()
    }

    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        match self.size {
            AesKeySize::Aes128 => {
                suite::seal_prefixed(&Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&self.key)), plaintext)
            }
            AesKeySize::Aes192 => {
                suite::seal_prefixed(&Aes192Gcm::new(Key::<Aes192Gcm>::from_slice(&self.key)), plaintext)
            }
            AesKeySize::Aes256 => {
                suite::seal_prefixed(&Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key)), plaintext)
            }
        }
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        match self.size {
            AesKeySize::Aes128 => {
                suite::open_prefixed(&Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&self.key)), ciphertext)
            }
            AesKeySize::Aes192 => {
                suite::open_prefixed(&Aes192Gcm::new(Key::<Aes192Gcm>::from_slice(&self.key)), ciphertext)
            }
            AesKeySize::Aes256 => {
                suite::open_prefixed(&Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key)), ciphertext)
            }
        }
    }

    fn key_material(&self) -> &[u8] {
        &self.key
    }
}
