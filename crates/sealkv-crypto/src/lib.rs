//! sealkv-crypto: value encryption for sealkv
//!
//! Architecture: per-write key derivation + streaming AEAD
//!
//! Pipeline: codec bytes → derive key (fresh nonce) → chunked AEAD stream → envelope
//!
//! Key hierarchy:
//! ```text
//! Master Secret (256-bit, caller supplied, held by the Store)
//!   └── Derived Key (per value, HKDF-SHA256, salt = random 256-bit nonce)
//!       └── Stream AEAD: AES-256-GCM or ChaCha20-Poly1305
//!           (nonce = frame_index||flags, AAD = stream header||frame header)
//! ```
//!
//! Envelope format (binary):
//! ```text
//! [32 bytes: derivation nonce][2 bytes: stream header][frame]*
//! ```
//!
//! The standalone [`CipherSuite`] implementations hold their own persistent
//! key and are independent of the envelope.

pub mod aes;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod poly1305;
pub mod random;
pub mod secretbox;
pub mod stream;
pub mod suite;
pub mod xchacha;

pub use envelope::{envelope_nonce, open, open_into, seal, EnvelopeWriter};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_key, generate_nonce, DerivationNonce, DerivedKey, MasterSecret};
pub use stream::{DecryptReader, EncryptWriter};
pub use suite::{Algorithm, CipherSuite, SuiteKey};

/// Size of a master or derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the per-value derivation nonce that prefixes every envelope
pub const DERIVATION_NONCE_SIZE: usize = 32;

/// Size of a Poly1305 / GCM authentication tag
pub const TAG_SIZE: usize = 16;
