//! sealkv: encrypted key-value storage
//!
//! Values are serialized by a pluggable codec, sealed in a streaming AEAD
//! envelope under a key derived fresh for every write, and stored in a
//! pluggable backend.
//!
//! ```no_run
//! use sealkv::{MasterSecret, MemoryBackend, Store};
//!
//! # fn main() -> Result<(), sealkv::StoreError> {
//! let store = Store::json(MemoryBackend::new(), MasterSecret::from_bytes([7u8; 32]));
//! store.put("greeting", &"hello".to_string())?;
//! let value: String = store.get("greeting")?;
//! assert_eq!(value, "hello");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod pool;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use pool::{BufferPool, PooledBuffer};
pub use store::Store;

pub use sealkv_codec as codec;
pub use sealkv_crypto as crypto;
pub use sealkv_storage as storage;

pub use sealkv_codec::{AnyCodec, BinaryCodec, Codec, JsonCodec, PrimedCodec, TypeTable, XmlCodec};
pub use sealkv_core::config::{EnvelopeConfig, PoolConfig};
pub use sealkv_core::{CodecKind, ListPair, StoreConfig, StreamSuite};
pub use sealkv_crypto::MasterSecret;
pub use sealkv_storage::{Backend, BackendError, KvPair, MemoryBackend};
#[cfg(feature = "rocksdb")]
pub use sealkv_storage::RocksBackend;
