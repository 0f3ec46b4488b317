// Reusable `BitBuffer` pool.
//
// Acquisition hands out an RAII guard; dropping the guard clears the buffer
// and returns it to the free list, so every exit path (including `?` and
// panics unwinding through the caller) releases it.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use super::buffer::BitBuffer;

/// Default number of idle buffers retained.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Default byte capacity of freshly allocated buffers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Thread-safe pool of cleared [`BitBuffer`]s.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<BitBuffer>>,
    max_idle: usize,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Create a pool with default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_IDLE, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a pool keeping at most `max_idle` idle buffers, allocating new
    /// ones with `buffer_capacity` bytes.
    pub fn with_limits(max_idle: usize, buffer_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
            buffer_capacity,
        }
    }

    /// Take a cleared buffer from the pool, allocating if none is idle.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| BitBuffer::with_capacity(self.buffer_capacity));
        PooledBuffer {
            pool: self,
            buf: Some(buf),
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut buf: BitBuffer) {
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer on loan from a [`BufferPool`].  Returned on drop.
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buf: Option<BitBuffer>,
}

impl PooledBuffer<'_> {
    /// Detach the buffer from the pool; it will not be returned.
    pub fn into_inner(mut self) -> BitBuffer {
        self.buf.take().unwrap_or_default()
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = BitBuffer;

    fn deref(&self) -> &BitBuffer {
        // Only `into_inner` and `drop` empty the slot, and both consume the guard.
        self.buf.as_ref().expect("pooled buffer already released")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BitBuffer {
        self.buf.as_mut().expect("pooled buffer already released")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}
