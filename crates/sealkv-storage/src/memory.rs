//! In-memory backend
//!
//! Keys are kept sorted, so `list` enumerates in lexicographic order. Every
//! write takes the next value of a store-wide version counter, so a version
//! is never reused for the same key even after delete and re-create.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{BackendError, BackendResult};
use crate::{Backend, KvPair};

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    last_version: u64,
    closed: bool,
}

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    version: u64,
}

impl State {
    fn insert(&mut self, key: &str, value: &[u8]) -> u64 {
        self.last_version += 1;
        let version = self.last_version;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                version,
            },
        );
        version
    }

    fn current_version(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|e| e.version)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, State>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return Err(BackendError::Closed);
        }
        Ok(state)
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, State>> {
        let state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return Err(BackendError::Closed);
        }
        Ok(state)
    }
}

impl Backend for MemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        self.write()?.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> BackendResult<KvPair> {
        let state = self.read()?;
        let entry = state
            .entries
            .get(key)
            .ok_or_else(|| BackendError::NotFound(key.to_string()))?;
        Ok(KvPair {
            key: key.to_string(),
            value: entry.value.clone(),
            version: entry.version,
        })
    }

    fn delete(&self, key: &str) -> BackendResult<()> {
        self.write()?.entries.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        Ok(self.read()?.entries.contains_key(key))
    }

    fn list(&self, prefix: &str) -> BackendResult<Vec<KvPair>> {
        let state = self.read()?;
        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, e)| KvPair {
                key: k.clone(),
                value: e.value.clone(),
                version: e.version,
            })
            .collect())
    }

    fn delete_tree(&self, prefix: &str) -> BackendResult<()> {
        let mut state = self.write()?;
        let before = state.entries.len();
        state.entries.retain(|k, _| !k.starts_with(prefix));
        tracing::debug!(prefix, removed = before - state.entries.len(), "deleted tree");
        Ok(())
    }

    fn close(&self) -> BackendResult<()> {
        let mut state = self.write()?;
        state.closed = true;
        state.entries.clear();
        Ok(())
    }

    fn atomic_put(&self, key: &str, value: &[u8], previous: Option<u64>) -> BackendResult<u64> {
        let mut state = self.write()?;
        if state.current_version(key) != previous {
            return Err(BackendError::VersionMismatch {
                key: key.to_string(),
            });
        }
        Ok(state.insert(key, value))
    }

    fn atomic_delete(&self, key: &str, version: u64) -> BackendResult<()> {
        let mut state = self.write()?;
        match state.current_version(key) {
            None => Err(BackendError::NotFound(key.to_string())),
            Some(current) if current != version => Err(BackendError::VersionMismatch {
                key: key.to_string(),
            }),
            Some(_) => {
                state.entries.remove(key);
                Ok(())
            }
        }
    }
}
