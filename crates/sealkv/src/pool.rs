//! Scratch buffer pool
//!
//! Buffers hold plaintext on the read path, so every buffer is zeroized when
//! its guard drops (including on error and unwind) before it is returned to
//! the pool or freed.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use sealkv_core::config::PoolConfig;
use zeroize::Zeroize;

#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_buffers: usize,
    max_retained_bytes: usize,
}

impl BufferPool {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(config.max_buffers)),
            max_buffers: config.max_buffers,
            max_retained_bytes: config.max_retained_bytes,
        }
    }

    /// Take an empty buffer, reusing a pooled one when available.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        PooledBuffer { pool: self, buf }
    }

    /// Buffers currently waiting for reuse
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.zeroize();
        if buf.capacity() > self.max_retained_bytes {
            return;
        }
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_buffers {
            free.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
