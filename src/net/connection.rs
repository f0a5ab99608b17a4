//! Per-connection context and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Accumulate a request body delivered across many chunks
//! - Drive the `New → Accumulating → Complete` transitions
//! - Count live contexts so every terminal path is observable
//!
//! # Design Decisions
//! - The body buffer is length-tracked; embedded zero bytes are preserved
//! - Capacity at least doubles on growth, bounded by the body limit
//! - A context is owned by exactly one request task and released on drop,
//!   so early returns cannot leak or double-release it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;

use crate::error::GatewayError;
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// First allocation made by a growing [`BodyBuffer`].
const MIN_CAPACITY: usize = 1024;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Growable, length-tracked byte buffer.
#[derive(Debug)]
pub struct BodyBuffer {
    buf: Vec<u8>,
    limit: usize,
}

impl BodyBuffer {
    /// Create an empty buffer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    /// Append `chunk`, growing capacity geometrically when needed.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), GatewayError> {
        let needed = self
            .buf
            .len()
            .checked_add(chunk.len())
            .filter(|needed| *needed <= self.limit)
            .ok_or(GatewayError::BodyTooLarge { limit: self.limit })?;

        if needed > self.buf.capacity() {
            let target = needed
                .max(self.buf.capacity().saturating_mul(2))
                .max(MIN_CAPACITY)
                .min(self.limit);
            self.buf
                .try_reserve_exact(target - self.buf.len())
                .map_err(|_| GatewayError::Allocation { requested: target })?;
        }

        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Take ownership of the finished contents.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

/// Body-accumulation state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Context allocated, no bytes seen yet.
    New,
    /// At least one chunk appended.
    Accumulating,
    /// Body fully received and handed off.
    Complete,
}

/// Mutable per-connection accumulator.
#[derive(Debug)]
pub struct ConnectionContext {
    state: ConnectionState,
    body: BodyBuffer,
    guard: ConnectionGuard,
}

impl ConnectionContext {
    /// Allocate a context in the `New` state.
    pub fn open(tracker: &ConnectionTracker, max_body_bytes: usize) -> Self {
        Self {
            state: ConnectionState::New,
            body: BodyBuffer::with_limit(max_body_bytes),
            guard: tracker.track(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.guard.id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Append one chunk. Returns the number of bytes consumed, which is
    /// always the whole chunk on success.
    pub fn accept_chunk(&mut self, chunk: &[u8]) -> Result<usize, GatewayError> {
        if chunk.is_empty() {
            return Ok(0);
        }
        self.body.append(chunk)?;
        self.state = ConnectionState::Accumulating;
        tracing::trace!(
            connection_id = %self.id(),
            chunk_len = chunk.len(),
            total = self.body.len(),
            "Chunk accumulated"
        );
        Ok(chunk.len())
    }

    /// Transition to `Complete`, yielding the full body.
    ///
    /// The returned [`CompletedContext`] still holds the connection slot
    /// until it is dropped.
    pub fn finish(self) -> CompletedContext {
        let id = self.guard.id();
        tracing::debug!(connection_id = %id, body_len = self.body.len(), "Request body complete");
        CompletedContext {
            body: self.body.into_bytes(),
            guard: self.guard,
        }
    }
}

/// A connection whose body has been fully received.
#[derive(Debug)]
pub struct CompletedContext {
    body: Bytes,
    guard: ConnectionGuard,
}

impl CompletedContext {
    pub fn id(&self) -> ConnectionId {
        self.guard.id()
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::Complete
    }

    /// The accumulated body. Cloning [`Bytes`] does not copy the data.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}

/// Tracks live connection contexts.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live context. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::connection_opened();
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Number of contexts not yet released.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a context's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::connection_closed();
        tracing::trace!(connection_id = %self.id, "Connection context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn buffer_preserves_zero_bytes() {
        let mut buf = BodyBuffer::with_limit(64);
        buf.append(b"a\0b").unwrap();
        buf.append(b"\0\0").unwrap();
        buf.append(b"c").unwrap();
        assert_eq!(buf.len(), 6);
        assert_eq!(&buf.into_bytes()[..], b"a\0b\0\0c");
    }

    #[test]
    fn buffer_grows_geometrically() {
        let mut buf = BodyBuffer::with_limit(1 << 20);
        buf.append(&[1u8; 10]).unwrap();
        let first = buf.capacity();
        assert!(first >= MIN_CAPACITY);

        buf.append(&vec![2u8; first]).unwrap();
        assert!(buf.capacity() >= first * 2);
    }

    #[test]
    fn buffer_rejects_growth_past_limit() {
        let mut buf = BodyBuffer::with_limit(8);
        buf.append(b"12345").unwrap();
        let err = buf.append(b"6789").unwrap_err();
        assert!(matches!(err, GatewayError::BodyTooLarge { limit: 8 }));
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn context_state_transitions() {
        let tracker = ConnectionTracker::new();
        let mut ctx = ConnectionContext::open(&tracker, 1024);
        assert_eq!(ctx.state(), ConnectionState::New);

        assert_eq!(ctx.accept_chunk(b"").unwrap(), 0);
        assert_eq!(ctx.state(), ConnectionState::New);

        assert_eq!(ctx.accept_chunk(b"hello").unwrap(), 5);
        assert_eq!(ctx.state(), ConnectionState::Accumulating);

        let done = ctx.finish();
        assert_eq!(done.state(), ConnectionState::Complete);
        assert_eq!(&done.body()[..], b"hello");
    }

    #[test]
    fn context_released_exactly_once_on_every_path() {
        let tracker = ConnectionTracker::new();

        // completed path
        let ctx = ConnectionContext::open(&tracker, 16);
        assert_eq!(tracker.active_count(), 1);
        let done = ctx.finish();
        assert_eq!(tracker.active_count(), 1);
        drop(done);
        assert_eq!(tracker.active_count(), 0);

        // failure mid-accumulation
        let mut ctx = ConnectionContext::open(&tracker, 4);
        assert!(ctx.accept_chunk(b"too long").is_err());
        drop(ctx);
        assert_eq!(tracker.active_count(), 0);

        // abandoned before any bytes
        drop(ConnectionContext::open(&tracker, 4));
        assert_eq!(tracker.active_count(), 0);
    }
}
