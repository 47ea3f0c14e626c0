//! Per-value key derivation: master secret + random nonce → one-time key
//!
//! Every write draws a fresh 256-bit nonce and derives its data key with
//! HKDF-SHA256 (IKM = master secret, salt = nonce, empty info). The nonce is
//! stored in the clear in front of the ciphertext so a reader can re-derive
//! the same key. Leaking a derived key exposes only the value it sealed.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::{random, DERIVATION_NONCE_SIZE, KEY_SIZE};

/// Random salt stored in front of every envelope
pub type DerivationNonce = [u8; DERIVATION_NONCE_SIZE];

/// The long-lived 256-bit secret every value key is derived from.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone, Zeroize)]
pub struct MasterSecret {
    bytes: [u8; KEY_SIZE],
}

impl MasterSecret {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Copy a secret out of a slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::KeyLength {
            algorithm: "master secret",
            len: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Generate a random master secret.
    pub fn generate() -> CryptoResult<Self> {
        Ok(Self::from_bytes(random::bytes()?))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A one-time 256-bit data key. Zeroized on drop, never persisted.
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Draw a fresh derivation nonce from the OS CSPRNG.
pub fn generate_nonce() -> CryptoResult<DerivationNonce> {
    random::bytes()
}

/// Derive the data key for one value.
///
/// Deterministic in `(master, nonce)`: the writer calls it with a fresh nonce,
/// readers call it with the nonce read from the envelope prefix.
pub fn derive_key(master: &MasterSecret, nonce: &DerivationNonce) -> CryptoResult<DerivedKey> {
    let hkdf = Hkdf::<Sha256>::new(Some(&nonce[..]), master.as_bytes());
    let mut key = DerivedKey {
        bytes: [0u8; KEY_SIZE],
    };
    hkdf.expand(&[], &mut key.bytes)
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_master() -> MasterSecret {
        MasterSecret::from_bytes([42u8; KEY_SIZE])
    }

    #[test]
    fn test_derive_deterministic() {
        let master = test_master();
        let nonce = [7u8; DERIVATION_NONCE_SIZE];

        let k1 = derive_key(&master, &nonce).unwrap();
        let k2 = derive_key(&master, &nonce).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes(), "HKDF must be deterministic");
    }

    #[test]
    fn test_derive_different_nonces() {
        let master = test_master();

        let k1 = derive_key(&master, &[1u8; DERIVATION_NONCE_SIZE]).unwrap();
        let k2 = derive_key(&master, &[2u8; DERIVATION_NONCE_SIZE]).unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_different_masters() {
        let nonce = [9u8; DERIVATION_NONCE_SIZE];

        let k1 = derive_key(&MasterSecret::from_bytes([1u8; KEY_SIZE]), &nonce).unwrap();
        let k2 = derive_key(&MasterSecret::from_bytes([2u8; KEY_SIZE]), &nonce).unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_matches_hkdf_expand() {
        let master = test_master();
        let nonce = [3u8; DERIVATION_NONCE_SIZE];

        let mut expected = [0u8; KEY_SIZE];
        Hkdf::<Sha256>::new(Some(&nonce[..]), master.as_bytes())
            .expand(b"", &mut expected)
            .unwrap();

        assert_eq!(derive_key(&master, &nonce).unwrap().as_bytes(), &expected);
    }

    #[test]
    fn test_derived_key_differs_from_master() {
        let master = test_master();
        let key = derive_key(&master, &[0u8; DERIVATION_NONCE_SIZE]).unwrap();
        assert_ne!(key.as_bytes(), master.as_bytes());
    }

    #[test]
    fn test_nonces_are_fresh() {
        let a = generate_nonce().unwrap();
        let b = generate_nonce().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_master_from_slice_length() {
        assert!(MasterSecret::from_slice(&[0u8; KEY_SIZE]).is_ok());

        let err = MasterSecret::from_slice(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, CryptoError::KeyLength { len: 16, .. }));
    }

    #[test]
    fn test_debug_redacts() {
        let dbg = format!("{:?}", test_master());
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("42"));
    }

    #[test]
    fn test_master_zeroize_in_place() {
        let mut master = test_master();
        master.zeroize();
        assert_eq!(master.as_bytes(), &[0u8; KEY_SIZE]);

        let mut slot = Some(test_master());
        slot.zeroize();
        assert!(slot.is_none());
    }
}
