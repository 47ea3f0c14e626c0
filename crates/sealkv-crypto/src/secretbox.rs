//! NaCl secretbox suite (XSalsa20-Poly1305, 256-bit key, 192-bit nonce)

use crypto_secretbox::aead::KeyInit;
use crypto_secretbox::{Key, XSalsa20Poly1305};
use zeroize::Zeroizing;

use crate::error::CryptoResult;
use crate::suite::{self, decode_key_hex, fixed_key, Algorithm, CipherSuite};
use crate::{random, KEY_SIZE};

pub struct SecretBoxSuite {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl std::fmt::Debug for SecretBoxSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBoxSuite")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SecretBoxSuite {
    pub fn generate() -> CryptoResult<Self> {
        Ok(Self {
            key: Zeroizing::new(random::bytes()?),
        })
    }

    pub fn from_bytes(key: &[u8]) -> CryptoResult<Self> {
        Ok(Self {
            key: fixed_key(Algorithm::SecretBox, key)?,
        })
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        Self::from_bytes(&decode_key_hex(s)?)
    }

    fn cipher(&self) -> XSalsa20Poly1305 {
        XSalsa20Poly1305::new(Key::from_slice(&self.key[..]))
    }
}

impl CipherSuite for SecretBoxSuite {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SecretBox
    }

    /// The sealed message is 24 + 16 bytes longer than `plaintext`.
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
