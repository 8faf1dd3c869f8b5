//! Producer barriers - the write side of the ring.
//!
//! A producer claims a sequence, writes the slot through the returned
//! `ClaimedEntry`, then commits it. Claiming blocks while the slot would lap
//! the slowest tracked consumer.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::disruptor::consumer::Consumer;
use crate::disruptor::entry::{Entry, EntryTranslator};
use crate::disruptor::ring_buffer::RingBuffer;
use crate::disruptor::util::minimum_sequence;
use crate::disruptor::Sequence;
use crate::error::{DisruptorError, Result};

/// Exclusive handle to a claimed, not yet committed slot.
///
/// Dropping it without committing leaves the sequence unpublished: consumers
/// never see it and, with multiple producers, later commits stall behind it.
#[must_use = "a claimed entry must be committed or the ring stalls"]
pub struct ClaimedEntry<'a, T: Entry> {
    sequence: Sequence,
    entry: &'a mut T,
}

impl<T: Entry> ClaimedEntry<'_, T> {
    #[inline]
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }
}

impl<T: Entry> Deref for ClaimedEntry<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.entry
    }
}

impl<T: Entry> DerefMut for ClaimedEntry<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.entry
    }
}

impl<T: Entry> std::fmt::Debug for ClaimedEntry<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimedEntry")
            .field("sequence", &self.sequence)
            .field("entry", &self.entry)
            .finish()
    }
}

/// Spin (yielding) until `sequence` no longer laps the slowest consumer.
#[inline]
fn wait_for_capacity(capacity: usize, sequence: Sequence, consumers: &[Arc<dyn Consumer>]) {
    let capacity = capacity as Sequence;
    if sequence - minimum_sequence(consumers) < capacity {
        return;
    }

    trace_debug!("producer stalled on back-pressure at sequence {}", sequence);
    while sequence - minimum_sequence(consumers) >= capacity {
        std::thread::yield_now();
    }
}

fn require_consumers(consumers: &[Arc<dyn Consumer>]) -> Result<()> {
    if consumers.is_empty() {
        return Err(DisruptorError::config(
            "Producer barrier must track at least one consumer",
        ));
    }
    Ok(())
}

/// Claim/commit gate for one or more producers (per the ring's
/// `ClaimStrategy`).
pub struct ProducerBarrier<T: Entry> {
    ring_buffer: Arc<RingBuffer<T>>,
    consumers: Vec<Arc<dyn Consumer>>,
}

impl<T: Entry> ProducerBarrier<T> {
    pub(crate) fn new(
        ring_buffer: Arc<RingBuffer<T>>,
        consumers: Vec<Arc<dyn Consumer>>,
    ) -> Result<Self> {
        require_consumers(&consumers)?;
        Ok(Self {
            ring_buffer,
            consumers,
        })
    }

    /// Claim the next slot, blocking while it would overwrite an entry some
    /// tracked consumer has not processed yet.
    ///
    /// The entry's sequence is already set on return.
    pub fn next_entry(&self) -> ClaimedEntry<'_, T> {
        let sequence = self.ring_buffer.claim().claim_next();
        wait_for_capacity(self.ring_buffer.capacity(), sequence, &self.consumers);

        // SAFETY: `sequence` was just claimed by this call and every tracked
        // consumer is past `sequence - capacity`.
        let entry = unsafe { self.ring_buffer.entry_mut(sequence) };
        entry.set_sequence(sequence);
        ClaimedEntry { sequence, entry }
    }

    /// Publish a claimed entry, waking waiting consumers.
    ///
    /// With multiple producers this first waits for every earlier claim to
    /// be committed, so the cursor advances in claim order.
    pub fn commit(&self, entry: ClaimedEntry<'_, T>) {
        let sequence = entry.sequence;
        drop(entry);

        self.ring_buffer
            .claim()
            .wait_for_cursor(sequence - 1, self.ring_buffer.cursor_sequence());
        self.ring_buffer.publish(sequence);
    }

    /// Claim, fill with `f`, commit. Returns the published sequence.
    #[inline]
    pub fn publish_with<F: FnOnce(&mut T)>(&self, f: F) -> Sequence {
        let mut entry = self.next_entry();
        f(&mut *entry);
        let sequence = entry.sequence();
        self.commit(entry);
        sequence
    }

    #[inline]
    pub fn publish_translated<E: EntryTranslator<T>>(&self, translator: &E) -> Sequence {
        self.publish_with(|entry| translator.translate_to(entry))
    }

    pub fn cursor(&self) -> Sequence {
        self.ring_buffer.cursor()
    }

    pub fn ring_buffer(&self) -> &Arc<RingBuffer<T>> {
        &self.ring_buffer
    }
}

impl<T: Entry> std::fmt::Debug for ProducerBarrier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerBarrier")
            .field("cursor", &self.cursor())
            .field("tracked_consumers", &self.consumers.len())
            .finish()
    }
}

/// Writes entries at caller-chosen sequences, e.g. to pre-fill a ring
/// before normal production starts.
pub struct ForceFillProducerBarrier<T: Entry> {
    ring_buffer: Arc<RingBuffer<T>>,
    consumers: Vec<Arc<dyn Consumer>>,
}

impl<T: Entry> ForceFillProducerBarrier<T> {
    pub(crate) fn new(
        ring_buffer: Arc<RingBuffer<T>>,
        consumers: Vec<Arc<dyn Consumer>>,
    ) -> Result<Self> {
        require_consumers(&consumers)?;
        Ok(Self {
            ring_buffer,
            consumers,
        })
    }

    /// Claim the slot for `sequence`, blocking while it would lap the
    /// slowest tracked consumer.
    ///
    /// # Safety
    ///
    /// - No other producer (force-fill or regular) may be active on the ring.
    /// - No other `ClaimedEntry` for `sequence` may be alive.
    pub unsafe fn claim_entry(&self, sequence: Sequence) -> ClaimedEntry<'_, T> {
        wait_for_capacity(self.ring_buffer.capacity(), sequence, &self.consumers);

        let entry = self.ring_buffer.entry_mut(sequence);
        entry.set_sequence(sequence);
        ClaimedEntry { sequence, entry }
    }

    /// Publish `entry` and move the claim counter just past it, so a regular
    /// producer continues from there.
    pub fn commit(&self, entry: ClaimedEntry<'_, T>) {
        let sequence = entry.sequence;
        drop(entry);

        self.ring_buffer.claim().set_sequence(sequence + 1);
        self.ring_buffer.publish(sequence);
    }

    pub fn cursor(&self) -> Sequence {
        self.ring_buffer.cursor()
    }
}

impl<T: Entry> std::fmt::Debug for ForceFillProducerBarrier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceFillProducerBarrier")
            .field("cursor", &self.cursor())
            .field("tracked_consumers", &self.consumers.len())
            .finish()
    }
}
