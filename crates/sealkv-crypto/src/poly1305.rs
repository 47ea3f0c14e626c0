//! Poly1305 suite: IETF ChaCha20-Poly1305 (256-bit key, 96-bit random nonce)
//!
//! Random 96-bit nonces are only safe for a bounded number of messages per
//! key; prefer XChaCha20-Poly1305 for long-lived keys.

use aead::KeyInit;
use chacha20poly1305::{ChaCha20Poly1305, Key};
use zeroize::Zeroizing;

use crate::error::CryptoResult;
use crate::suite::{self, decode_key_hex, fixed_key, Algorithm, CipherSuite};
use crate::{random, KEY_SIZE};

pub struct ChaCha20Poly1305Suite {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl std::fmt::Debug for ChaCha20Poly1305Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaCha20Poly1305Suite")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl ChaCha20Poly1305Suite {
    pub fn generate() -> CryptoResult<Self> {
        Ok(Self {
            key: Zeroizing::new(random::bytes()?),
        })
    }

    pub fn from_bytes(key: &[u8]) -> CryptoResult<Self> {
        Ok(Self {
            key: fixed_key(Algorithm::ChaCha20Poly1305, key)?,
        })
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        Self::from_bytes(&decode_key_hex(s)?)
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key[..]))
    }
}

impl CipherSuite for ChaCha20Poly1305Suite {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ChaCha20Poly1305
    }

    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        suite::seal_prefixed(&self.cipher(), plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        suite::open_prefixed(&self.cipher(), ciphertext)
    }

    fn key_material(&self) -> &[u8] {
        &self.key[..]
    }
}
