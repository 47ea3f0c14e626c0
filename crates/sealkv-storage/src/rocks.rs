//! RocksDB backend
//!
//! Each value is stored as `version (8 bytes BE) || envelope`. The version
//! counter is store-wide and recovered on open from the highest stored
//! version. Writes are serialized behind a lock so the compare-and-swap
//! operations are atomic with respect to every other writer.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Context};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};

use crate::error::{BackendError, BackendResult};
use crate::{Backend, KvPair};

const VERSION_SIZE: usize = 8;

struct Inner {
    db: DB,
    last_version: u64,
}

pub struct RocksBackend {
    inner: RwLock<Option<Inner>>,
}

impl RocksBackend {
    /// Open or create a RocksDB database at the given path.
    pub fn open(db_path: &Path) -> BackendResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, db_path)
            .with_context(|| format!("opening RocksDB: {}", db_path.display()))?;

        let mut last_version = 0;
        for item in db.iterator(IteratorMode::Start) {
            let (key, value) = item.context("iterating RocksDB entries")?;
            let (version, _) = split_value(&key, &value)?;
            last_version = last_version.max(version);
        }
        tracing::debug!(path = %db_path.display(), last_version, "opened RocksDB backend");

        Ok(Self {
            inner: RwLock::new(Some(Inner { db, last_version })),
        })
    }

    fn with_read<T>(&self, f: impl FnOnce(&Inner) -> BackendResult<T>) -> BackendResult<T> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref().ok_or(BackendError::Closed)?)
    }

    fn with_write<T>(&self, f: impl FnOnce(&mut Inner) -> BackendResult<T>) -> BackendResult<T> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_mut().ok_or(BackendError::Closed)?)
    }
}

impl Inner {
    fn read(&self, key: &str) -> BackendResult<Option<KvPair>> {
        let raw = self
            .db
            .get(key.as_bytes())
            .with_context(|| format!("RocksDB get {key}"))?;
        raw.map(|raw| pair(key.as_bytes(), &raw)).transpose()
    }

    fn write(&mut self, key: &str, value: &[u8]) -> BackendResult<u64> {
        let version = self.last_version + 1;
        let mut raw = Vec::with_capacity(VERSION_SIZE + value.len());
        raw.extend_from_slice(&version.to_be_bytes());
        raw.extend_from_slice(value);
        self.db
            .put(key.as_bytes(), &raw)
            .with_context(|| format!("RocksDB put {key}"))?;
        self.last_version = version;
        Ok(version)
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        self.db
            .delete(key.as_bytes())
            .with_context(|| format!("RocksDB delete {key}"))?;
        Ok(())
    }

    fn scan(&self, prefix: &str) -> BackendResult<Vec<KvPair>> {
        let mut pairs = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        for item in iter {
            let (key, value) = item.context("iterating RocksDB entries")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            pairs.push(pair(&key, &value)?);
        }
        Ok(pairs)
    }
}

fn split_value<'a>(key: &[u8], raw: &'a [u8]) -> BackendResult<(u64, &'a [u8])> {
    if raw.len() < VERSION_SIZE {
        return Err(anyhow!(
            "corrupt RocksDB entry {}: {} bytes",
            String::from_utf8_lossy(key),
            raw.len()
        )
        .into());
    }
    let (version, value) = raw.split_at(VERSION_SIZE);
    let mut buf = [0u8; VERSION_SIZE];
    buf.copy_from_slice(version);
    Ok((u64::from_be_bytes(buf), value))
}

fn pair(key: &[u8], raw: &[u8]) -> BackendResult<KvPair> {
    let (version, value) = split_value(key, raw)?;
    let key = String::from_utf8(key.to_vec()).context("non UTF-8 key in RocksDB")?;
    Ok(KvPair {
        key,
        value: value.to_vec(),
        version,
    })
}

impl Backend for RocksBackend {
    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        self.with_write(|inner| inner.write(key, value).map(|_| ()))
    }

    fn get(&self, key: &str) -> BackendResult<KvPair> {
        self.with_read(|inner| {
            inner
                .read(key)?
                .ok_or_else(|| BackendError::NotFound(key.to_string()))
        })
    }

    fn delete(&self, key: &str) -> BackendResult<()> {
        self.with_write(|inner| inner.remove(key))
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        self.with_read(|inner| {
            let found = inner
                .db
                .get_pinned(key.as_bytes())
                .with_context(|| format!("RocksDB get {key}"))?;
            Ok(found.is_some())
        })
    }

    fn list(&self, prefix: &str) -> BackendResult<Vec<KvPair>> {
        self.with_read(|inner| inner.scan(prefix))
    }

    fn delete_tree(&self, prefix: &str) -> BackendResult<()> {
        self.with_write(|inner| {
            let pairs = inner.scan(prefix)?;
            let mut batch = WriteBatch::default();
            for p in &pairs {
                batch.delete(p.key.as_bytes());
            }
            inner
                .db
                .write(batch)
                .with_context(|| format!("RocksDB delete tree {prefix}"))?;
            tracing::debug!(prefix, removed = pairs.len(), "deleted tree");
            Ok(())
        })
    }

    fn close(&self) -> BackendResult<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let inner = guard.take().ok_or(BackendError::Closed)?;
        inner.db.flush().context("flushing RocksDB")?;
        Ok(())
    }

    fn atomic_put(&self, key: &str, value: &[u8], previous: Option<u64>) -> BackendResult<u64> {
        self.with_write(|inner| {
            let current = inner.read(key)?.map(|p| p.version);
            if current != previous {
                return Err(BackendError::VersionMismatch {
                    key: key.to_string(),
                });
            }
            inner.write(key, value)
        })
    }

    fn atomic_delete(&self, key: &str, version: u64) -> BackendResult<()> {
        self.with_write(|inner| match inner.read(key)? {
            None => Err(BackendError::NotFound(key.to_string())),
            Some(p) if p.version != version => Err(BackendError::VersionMismatch {
                key: key.to_string(),
            }),
            Some(_) => inner.remove(key),
        })
    }
}
