//! The store façade
//!
//! Write path: value → codec encoder → envelope writer (fresh nonce, derived
//! key, streaming AEAD) → backend. Read path is the inverse, with plaintext
//! staged in zeroizing pooled buffers.

use std::sync::{PoisonError, RwLock};

use sealkv_codec::{AnyCodec, BinaryCodec, Codec, Decoder, Encoder, JsonCodec, TypeTable, XmlCodec};
use sealkv_core::config::{EnvelopeConfig, PoolConfig, StoreConfig};
use sealkv_core::ListPair;
use sealkv_crypto::{open_into, EnvelopeWriter, MasterSecret};
use sealkv_storage::Backend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroize;

use crate::error::{StoreError, StoreResult};
use crate::pool::BufferPool;

/// Encrypted key-value store over a [`Backend`].
///
/// Every `put` derives a one-time key from the master secret and a fresh
/// random nonce, so no two stored values share a key. `Store` is `Send +
/// Sync`; share it behind an `Arc`.
pub struct Store<C: Codec = AnyCodec> {
    backend: Box<dyn Backend>,
    codec: C,
    envelope: EnvelopeConfig,
    master: RwLock<Option<MasterSecret>>,
    pool: BufferPool,
}

impl<C: Codec> std::fmt::Debug for Store<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("envelope", &self.envelope)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Store<JsonCodec> {
    /// Store with the JSON codec and default envelope settings.
    pub fn json(backend: impl Backend + 'static, master: MasterSecret) -> Self {
        Self::with_defaults(backend, master, JsonCodec)
    }
}

impl Store<XmlCodec> {
    /// Store with the XML codec and default envelope settings.
    pub fn xml(backend: impl Backend + 'static, master: MasterSecret) -> Self {
        Self::with_defaults(backend, master, XmlCodec)
    }
}

impl Store<BinaryCodec> {
    /// Store with the binary codec over `table` and default envelope settings.
    pub fn binary(backend: impl Backend + 'static, master: MasterSecret, table: TypeTable) -> Self {
        Self::with_defaults(backend, master, BinaryCodec::new(table))
    }
}

impl Store<AnyCodec> {
    /// Build a store from loaded configuration. `table` is used only when
    /// the configured codec is `binary`.
    pub fn from_config(
        backend: impl Backend + 'static,
        master: MasterSecret,
        config: &StoreConfig,
        table: TypeTable,
    ) -> StoreResult<Self> {
        let codec = AnyCodec::from_kind(config.codec.kind, table);
        Self::new(backend, master, codec, config.envelope, config.pool)
    }
}

impl<C: Codec> Store<C> {
    pub fn new(
        backend: impl Backend + 'static,
        master: MasterSecret,
        codec: C,
        envelope: EnvelopeConfig,
        pool: PoolConfig,
    ) -> StoreResult<Self> {
        envelope.validate()?;
        pool.validate()?;
        tracing::debug!(suite = %envelope.suite, chunk_size = envelope.chunk_size, "opening store");
        Ok(Self {
            backend: Box::new(backend),
            codec,
            envelope,
            master: RwLock::new(Some(master)),
            pool: BufferPool::new(&pool),
        })
    }

    fn with_defaults(backend: impl Backend + 'static, master: MasterSecret, codec: C) -> Self {
        Self {
            backend: Box::new(backend),
            codec,
            envelope: EnvelopeConfig::default(),
            master: RwLock::new(Some(master)),
            pool: BufferPool::default(),
        }
    }

    /// Replace the codec. Values written with the old codec become unreadable
    /// through the returned store.
    pub fn with_codec<D: Codec>(self, codec: D) -> Store<D> {
        Store {
            backend: self.backend,
            codec,
            envelope: self.envelope,
            master: self.master,
            pool: self.pool,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn envelope_config(&self) -> &EnvelopeConfig {
        &self.envelope
    }

    pub fn is_closed(&self) -> bool {
        self.master
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn with_master<T>(&self, f: impl FnOnce(&MasterSecret) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.master.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref().ok_or(StoreError::Closed)?)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Encode and seal `value`, then hand the finished envelope to `f`.
    fn seal<T, R>(&self, value: &T, f: impl FnOnce(&[u8]) -> StoreResult<R>) -> StoreResult<R>
    where
        T: Serialize + 'static,
    {
        let mut buf = self.pool.acquire();
        self.with_master(|master| {
            let mut writer = EnvelopeWriter::new(master, &self.envelope, &mut *buf)?;
            self.codec
                .new_encoder(&mut writer)
                .and_then(|mut enc| enc.encode(value))
                .map_err(StoreError::encoding)?;
            writer.finish()?;
            Ok(())
        })?;
        f(buf.as_slice())
    }

    /// Open an envelope and decode one value from it.
    fn open<T: DeserializeOwned + 'static>(&self, envelope: &[u8]) -> StoreResult<T> {
        let mut plain = self.pool.acquire();
        self.with_master(|master| Ok(open_into(master, envelope, &mut plain)?))?;
        self.codec
            .new_decoder(plain.as_slice())
            .and_then(|mut dec| dec.decode())
            .map_err(StoreError::decoding)
    }

    /// Serialize, encrypt and store `value` under `key`.
    pub fn put<T: Serialize + 'static>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.seal(value, |envelope| {
            self.backend.put(key, envelope)?;
            tracing::debug!(key, bytes = envelope.len(), "put");
            Ok(())
        })
    }

    /// Read and decrypt the value under `key`.
    pub fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> StoreResult<T> {
        self.get_versioned(key).map(|(value, _)| value)
    }

    /// Like [`Store::get`], writing into a caller-provided destination.
    pub fn get_into<T: DeserializeOwned + 'static>(
        &self,
        key: &str,
        out: Option<&mut T>,
    ) -> StoreResult<()> {
        let out = out.ok_or(StoreError::NilOutput)?;
        *out = self.get(key)?;
        Ok(())
    }

    /// Read a value together with the backend version it was stored at.
    pub fn get_versioned<T: DeserializeOwned + 'static>(&self, key: &str) -> StoreResult<(T, u64)> {
        self.ensure_open()?;
        let pair = self.backend.get(key).map_err(StoreError::reading)?;
        let value = self.open(&pair.value)?;
        tracing::debug!(key, version = pair.version, "get");
        Ok((value, pair.version))
    }

    /// Decrypt every value under `prefix`, in backend order. One bad entry
    /// fails the whole call.
    pub fn list<T: DeserializeOwned + 'static>(&self, prefix: &str) -> StoreResult<Vec<ListPair<T>>> {
        self.ensure_open()?;
        let pairs = self.backend.list(prefix)?;
        let mut out = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let value = self.open(&pair.value).map_err(|e| {
                tracing::debug!(key = %pair.key, error = %e, "list entry failed");
                e
            })?;
            out.push(ListPair::new(pair.key, value));
        }
        tracing::debug!(prefix, count = out.len(), "list");
        Ok(out)
    }

    /// Like [`Store::list`], replacing the contents of `out` with the values
    /// and returning their keys in the same order. `out` is untouched on error.
    pub fn list_into<T: DeserializeOwned + 'static>(
        &self,
        prefix: &str,
        out: Option<&mut Vec<T>>,
    ) -> StoreResult<Vec<String>> {
        let out = out.ok_or(StoreError::InvalidOutput)?;
        let (keys, values) = self
            .list(prefix)?
            .into_iter()
            .map(|pair| (pair.key, pair.value))
            .unzip();
        *out = values;
        Ok(keys)
    }

    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.delete(key)?;
        Ok(())
    }

    pub fn exists(&self, key: &str) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.backend.exists(key)?)
    }

    pub fn delete_tree(&self, prefix: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.delete_tree(prefix)?;
        Ok(())
    }

    /// Compare-and-swap write; see [`Backend::atomic_put`].
    pub fn atomic_put<T: Serialize + 'static>(
        &self,
        key: &str,
        value: &T,
        previous: Option<u64>,
    ) -> StoreResult<u64> {
        self.seal(value, |envelope| {
            let version = self.backend.atomic_put(key, envelope, previous)?;
            tracing::debug!(key, version, "atomic put");
            Ok(version)
        })
    }

    /// Compare-and-delete; see [`Backend::atomic_delete`].
    pub fn atomic_delete(&self, key: &str, version: u64) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend
            .atomic_delete(key, version)
            .map_err(StoreError::reading)
    }

    /// Encode with the store's codec only, without encryption.
    pub fn marshal<T: Serialize + 'static>(&self, value: &T) -> StoreResult<Vec<u8>> {
        self.codec.marshal(value).map_err(StoreError::encoding)
    }

    /// Decode with the store's codec only, without decryption.
    pub fn unmarshal<T: DeserializeOwned + 'static>(&self, data: &[u8]) -> StoreResult<T> {
        self.codec.unmarshal(data).map_err(StoreError::decoding)
    }

    /// Close the backend and wipe the master secret. Every later call fails
    /// with [`StoreError::Closed`].
    pub fn close(&self) -> StoreResult<()> {
        {
            let mut slot = self.master.write().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                return Err(StoreError::Closed);
            }
            // Wipes the secret where it lives and leaves the slot `None`.
            slot.zeroize();
        }
        self.backend.close()?;
        tracing::debug!("store closed");
        Ok(())
    }
}
