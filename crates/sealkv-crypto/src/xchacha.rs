//! XChaCha20-Poly1305 suite (256-bit key, 192-bit random nonce)

use aead::KeyInit;
use chacha20poly1305::{Key, XChaCha20Poly1305};
use zeroize::Zeroizing;

use crate::error::CryptoResult;
use crate::suite::{self, decode_key_hex, fixed_key, Algorithm, CipherSuite};
use crate::{random, KEY_SIZE};

pub struct XChaCha20Poly1305Suite {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl std::fmt::Debug for XChaCha20Poly1305Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XChaCha20Poly1305Suite")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl XChaCha20Poly1305Suite {
    pub fn generate() -> CryptoResult<Self> {
        Ok(Self {
            key: Zeroizing::new(random::bytes()?),
        })
    }

    pub fn from_bytes(key: &[u8]) -> CryptoResult<Self> {
        Ok(Self {
            key: fixed_key(Algorithm::XChaCha20Poly1305, key)?,
        })
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        Self::from_bytes(&decode_key_hex(s)?)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.key[..]))
    }
}

impl CipherSuite for XChaCha20Poly1305Suite {
    fn algorithm(&self) -> Algorithm {
        Algorithm::XChaCha20Poly1305
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let suite = XChaCha20Poly1305Suite::generate().unwrap();
        let plaintext = b"hello, encrypted world!";

        let encrypted = suite.encrypt(plaintext).unwrap();
        let decrypted = suite.decrypt(&encrypted).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypted_size() {
        let suite = XChaCha20Poly1305Suite::generate().unwrap();
        let encrypted = suite.encrypt(&[0u8; 1000]).unwrap();

        // nonce (24) + plaintext (1000) + tag (16) = 1040
        assert_eq!(encrypted.len(), 24 + 1000 + 16);
    }

    #[test]
    fn test_known_key_interop() {
        let key = [0x11u8; KEY_SIZE];
        let a = XChaCha20Poly1305Suite::from_bytes(&key).unwrap();
        let b = XChaCha20Poly1305Suite::from_hex(&"11".repeat(KEY_SIZE)).unwrap();

        let encrypted = a.encrypt(b"shared").unwrap();
        assert_eq!(b.decrypt(&encrypted).unwrap(), b"shared");
    }

    #[test]
    fn test_import_rejects_short_key() {
        let err = XChaCha20Poly1305Suite::from_bytes(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, CryptoError::KeyLength { len: 16, .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let suite = XChaCha20Poly1305Suite::from_bytes(&[0xAB; KEY_SIZE]).unwrap();
        let shown = format!("{suite:?}");
        assert!(shown.contains("REDACTED"), "{shown}");
        assert!(!shown.contains("171"), "{shown}");
    }
}
