//! Snapshot buffer pool and the pending-request slot.
//!
//! The pool is the engine's only backpressure mechanism: a tick cannot
//! complete until a free buffer exists to carry its snapshot. When the
//! pool runs dry the simulation thread parks the request in a
//! [`PendingSlot`] and services it as soon as a buffer comes back.

use pulsar_core::SnapshotBuffer;

/// Fixed-size pool of reusable snapshot buffers.
///
/// Buffers leave through [`acquire`](Self::acquire) when an update is
/// produced and return through [`release`](Self::release) when the
/// consumer is done reading them.
#[derive(Debug)]
pub struct BufferPool {
    free: Vec<SnapshotBuffer>,
    capacity: usize,
}

impl BufferPool {
    /// A pool holding `count` empty buffers.
    pub fn new(count: usize) -> Self {
        let mut free = Vec::with_capacity(count);
        free.resize_with(count, SnapshotBuffer::default);
        Self {
            free,
            capacity: count,
        }
    }

    /// Take a free buffer, or `None` if the pool is exhausted.
    pub fn acquire(&mut self) -> Option<SnapshotBuffer> {
        self.free.pop()
    }

    /// Return a buffer to the pool. Contents are kept as-is; the
    /// encoder clears before writing.
    pub fn release(&mut self, buffer: SnapshotBuffer) {
        debug_assert!(self.free.len() < self.capacity);
        self.free.push(buffer);
    }

    /// Number of buffers currently free.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total number of buffers owned by the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// What the simulation thread should produce once a buffer frees up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProduceRequest {
    /// Execute one tick and publish its snapshot.
    Advance,
    /// Publish a snapshot of the current state without ticking.
    Snapshot,
}

/// Single-slot queue of deferred produce requests.
///
/// At most one request is ever outstanding. A snapshot request
/// supersedes a queued advance (the consumer wants the current state,
/// not a stale step), while an advance never displaces a queued
/// snapshot.
#[derive(Debug, Default)]
pub(crate) struct PendingSlot(Option<ProduceRequest>);

impl PendingSlot {
    /// Queue `request`, collapsing it into whatever is already queued.
    pub(crate) fn queue(&mut self, request: ProduceRequest) {
        match request {
            ProduceRequest::Snapshot => self.0 = Some(ProduceRequest::Snapshot),
            ProduceRequest::Advance => {
                if self.0.is_none() {
                    self.0 = Some(ProduceRequest::Advance);
                }
            }
        }
    }

    /// Take the queued request, leaving the slot empty.
    pub(crate) fn take(&mut self) -> Option<ProduceRequest> {
        self.0.take()
    }
}
