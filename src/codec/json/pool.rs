//! Reusable JSON encode buffers
//!
//! An encode call leases one buffer, writes the whole document into it and
//! copies the result out. The buffer goes back to its pool when the lease is
//! dropped, whether encoding succeeded or not.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};
use tracing::warn;

use crate::codec::telemetry;
use crate::config::CodecConfig;

/// A pool of reusable byte buffers.
///
/// Cloning is cheap and shares the same idle set.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    idle: Mutex<Vec<Vec<u8>>>,
    max_idle: usize,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Pool keeping at most `max_idle` returned buffers, allocating new
    /// buffers with `buffer_capacity` bytes reserved.
    pub fn new(max_idle: usize, buffer_capacity: usize) -> Self {
        Self {
            inner: Arc::new(BufferPoolInner {
                idle: Mutex::new(Vec::with_capacity(max_idle)),
                max_idle,
                buffer_capacity,
            }),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.json_pool_size, config.json_buffer_capacity)
    }

    /// Process-wide pool, sized from the environment on first use.
    pub fn global() -> &'static BufferPool {
        static GLOBAL: OnceLock<BufferPool> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let config = CodecConfig::from_env().unwrap_or_else(|e| {
                warn!(error = %e, "Invalid codec config, using defaults for the JSON buffer pool");
                CodecConfig::default()
            });
            BufferPool::from_config(&config)
        })
    }

    /// Take an empty buffer, reusing an idle one when available.
    pub fn lease(&self) -> PooledBuffer {
        let reused = self.inner.idle.lock().pop();
        telemetry::record_pool_lease(reused.is_some());
        let buffer = reused.unwrap_or_else(|| Vec::with_capacity(self.inner.buffer_capacity));
        PooledBuffer {
            buffer,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of idle buffers waiting to be leased.
    pub fn available(&self) -> usize {
        self.inner.idle.lock().len()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("available", &self.available())
            .field("max_idle", &self.inner.max_idle)
            .finish()
    }
}

/// A leased buffer that returns to its pool when dropped.
pub struct PooledBuffer {
    buffer: Vec<u8>,
    pool: Arc<BufferPoolInner>,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_idle {
            idle.push(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_are_reused() {
        let pool = BufferPool::new(2, 64);
        assert_eq!(pool.available(), 0);
        {
            let mut buf = pool.lease();
            buf.extend_from_slice(b"hello");
        }
        assert_eq!(pool.available(), 1);

        let buf = pool.lease();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 64);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_idle_set_is_bounded() {
        let pool = BufferPool::new(1, 8);
        let a = pool.lease();
        let b = pool.lease();
        drop(a);
        drop(b);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_concurrent_leases_are_independent() {
        let pool = BufferPool::new(8, 16);
        std::thread::scope(|s| {
            for i in 0..4u8 {
                let pool = pool.clone();
                s.spawn(move || {
                    let mut buf = pool.lease();
                    buf.push(i);
                    assert_eq!(buf.as_slice(), &[i]);
                });
            }
        });
        assert!(pool.available() <= 4);
    }
}
