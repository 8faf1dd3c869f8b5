//! ConsumerBarrier - read-side gate onto the ring.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::disruptor::consumer::Consumer;
use crate::disruptor::entry::Entry;
use crate::disruptor::ring_buffer::RingBuffer;
use crate::disruptor::Sequence;
use crate::error::Alerted;

/// Gates a consumer on the ring cursor and any upstream consumers it must not
/// overtake.
pub struct ConsumerBarrier<T: Entry> {
    ring_buffer: Arc<RingBuffer<T>>,
    consumers: Vec<Arc<dyn Consumer>>,
    alerted: AtomicBool,
}

impl<T: Entry> ConsumerBarrier<T> {
    pub(crate) fn new(ring_buffer: Arc<RingBuffer<T>>, consumers: Vec<Arc<dyn Consumer>>) -> Self {
        Self {
            ring_buffer,
            consumers,
            alerted: AtomicBool::new(false),
        }
    }

    /// Wait for `sequence` to become available.
    ///
    /// Returns the highest available sequence (may exceed `sequence`), or
    /// `Alerted` if `alert()` was raised while waiting.
    #[inline]
    pub fn wait_for(&self, sequence: Sequence) -> Result<Sequence, Alerted> {
        self.ring_buffer.waiter().wait_for(
            sequence,
            self.ring_buffer.cursor_sequence(),
            &self.consumers,
            &self.alerted,
            None,
        )
    }

    /// Like `wait_for`, but gives up after `timeout` and returns the last
    /// observed sequence, which may still be below `sequence`.
    pub fn wait_for_timeout(
        &self,
        sequence: Sequence,
        timeout: Duration,
    ) -> Result<Sequence, Alerted> {
        self.ring_buffer.waiter().wait_for(
            sequence,
            self.ring_buffer.cursor_sequence(),
            &self.consumers,
            &self.alerted,
            Some(timeout),
        )
    }

    /// Entry at `sequence`. Call only for sequences returned by `wait_for`.
    #[inline]
    pub fn get_entry(&self, sequence: Sequence) -> &T {
        self.ring_buffer.get_entry(sequence)
    }

    pub fn cursor(&self) -> Sequence {
        self.ring_buffer.cursor()
    }

    pub fn is_alerted(&self) -> bool {
        self.alerted.load(Ordering::Acquire)
    }

    /// Abort any in-progress and future waits until `clear_alert`.
    pub fn alert(&self) {
        self.alerted.store(true, Ordering::Release);
        self.ring_buffer.waiter().signal_all();
    }

    pub fn clear_alert(&self) {
        self.alerted.store(false, Ordering::Release);
    }

    pub fn ring_buffer(&self) -> &Arc<RingBuffer<T>> {
        &self.ring_buffer
    }
}

impl<T: Entry> std::fmt::Debug for ConsumerBarrier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerBarrier")
            .field("cursor", &self.cursor())
            .field("tracked_consumers", &self.consumers.len())
            .field("alerted", &self.is_alerted())
            .finish()
    }
}
