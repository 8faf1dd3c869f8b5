//! The consumer contract seen by barriers.

use std::sync::Arc;

use crate::disruptor::entry::Entry;
use crate::disruptor::ring_buffer::RingBuffer;
use crate::disruptor::Sequence;

/// Anything whose progress a barrier can gate on.
///
/// Consumer barriers never report a sequence past the slowest consumer they
/// track; producer barriers never claim more than `capacity` past it.
pub trait Consumer: Send + Sync {
    /// Last sequence fully processed (-1 before the first).
    fn sequence(&self) -> Sequence;

    /// Ask the consumer to stop at its next opportunity.
    fn halt(&self);
}

/// Consumer that simply follows the ring cursor.
///
/// Gating a producer barrier on it allows filling the ring with no real
/// consumer attached.
pub struct NoOpConsumer<T: Entry> {
    ring_buffer: Arc<RingBuffer<T>>,
}

impl<T: Entry> NoOpConsumer<T> {
    pub fn new(ring_buffer: Arc<RingBuffer<T>>) -> Self {
        Self { ring_buffer }
    }
}

impl<T: Entry> Consumer for NoOpConsumer<T> {
    fn sequence(&self) -> Sequence {
        self.ring_buffer.cursor()
    }

    fn halt(&self) {}
}
