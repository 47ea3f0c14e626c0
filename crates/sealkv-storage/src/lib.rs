//! sealkv-storage: the key-value capability sealkv writes envelopes into
//!
//! # Overview
//! - [`Backend`]: minimal synchronous key-value trait (object safe)
//! - `memory`: thread-safe, versioned in-memory backend
//! - `rocks`: RocksDB backend (feature `rocksdb`)
//!
//! Backends store opaque bytes; they never see plaintext.

use std::sync::Arc;

pub mod error;
pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocks;

pub use error::{BackendError, BackendResult};
pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksBackend;

/// A stored entry as returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: Vec<u8>,
    /// Backend-assigned version, changes on every write of the key
    pub version: u64,
}

/// Key-value storage consumed by the store.
///
/// `get` of an absent key fails with [`BackendError::NotFound`]; `delete` of
/// an absent key succeeds. `list` returns entries in the backend's
/// enumeration order. After `close` every call fails with
/// [`BackendError::Closed`].
pub trait Backend: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()>;

    fn get(&self, key: &str) -> BackendResult<KvPair>;

    fn delete(&self, key: &str) -> BackendResult<()>;

    fn exists(&self, key: &str) -> BackendResult<bool>;

    fn list(&self, prefix: &str) -> BackendResult<Vec<KvPair>>;

    fn delete_tree(&self, prefix: &str) -> BackendResult<()>;

    fn close(&self) -> BackendResult<()>;

    /// Write `value` only if the key's current version is `previous`
    /// (`None`: only if the key is absent). Returns the new version.
    fn atomic_put(&self, _key: &str, _value: &[u8], _previous: Option<u64>) -> BackendResult<u64> {
        Err(BackendError::Unsupported("atomic_put"))
    }

    /// Delete the key only if its current version is `version`.
    fn atomic_delete(&self, _key: &str, _version: u64) -> BackendResult<()> {
        Err(BackendError::Unsupported("atomic_delete"))
    }
}

macro_rules! forward_backend {
    ($ptr:ident) => {
        impl<B: Backend + ?Sized> Backend for $ptr<B> {
            fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
                (**self).put(key, value)
            }

            fn get(&self, key: &str) -> BackendResult<KvPair> {
                (**self).get(key)
            }

            fn delete(&self, key: &str) -> BackendResult<()> {
                (**self).delete(key)
            }

            fn exists(&self, key: &str) -> BackendResult<bool> {
                (**self).exists(key)
            }

            fn list(&self, prefix: &str) -> BackendResult<Vec<KvPair>> {
                (**self).list(prefix)
            }

            fn delete_tree(&self, prefix: &str) -> BackendResult<()> {
                (**self).delete_tree(prefix)
            }

            fn close(&self) -> BackendResult<()> {
                (**self).close()
            }

            fn atomic_put(
                &self,
                key: &str,
                value: &[u8],
                previous: Option<u64>,
            ) -> BackendResult<u64> {
                (**self).atomic_put(key, value, previous)
            }

            fn atomic_delete(&self, key: &str, version: u64) -> BackendResult<()> {
                (**self).atomic_delete(key, version)
            }
        }
    };
}

forward_backend!(Box);
forward_backend!(Arc);
