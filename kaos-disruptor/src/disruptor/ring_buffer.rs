//! RingBuffer - pre-allocated store of reusable entries.
//!
//! Entries live at `sequence & (capacity - 1)`. Nothing here synchronizes
//! access to a slot: that is the barriers' job. A slot is written only by the
//! producer holding its claim, and only once every tracked consumer has moved
//! past `sequence - capacity`; it is read only once the cursor (or the
//! upstream consumers) has reached `sequence`.

use std::cell::UnsafeCell;
use std::sync::Arc;

use crate::disruptor::barrier::ConsumerBarrier;
use crate::disruptor::claim::{ClaimSequencer, ClaimStrategy};
use crate::disruptor::consumer::Consumer;
use crate::disruptor::entry::{Entry, EntryFactory};
use crate::disruptor::padding::PaddedSequence;
use crate::disruptor::producer::{ForceFillProducerBarrier, ProducerBarrier};
use crate::disruptor::wait::{WaitStrategy, Waiter};
use crate::disruptor::{RingBufferConfig, Sequence, INITIAL_CURSOR_VALUE};
use crate::error::{DisruptorError, Result};

pub struct RingBuffer<T: Entry> {
    cursor: PaddedSequence,
    entries: Box<[UnsafeCell<T>]>,
    mask: usize,
    claim: ClaimSequencer,
    waiter: Waiter,
}

// Slots are shared across threads; exclusive access per slot is guaranteed
// by the claim/commit protocol, not by the type system.
unsafe impl<T: Entry> Send for RingBuffer<T> {}
unsafe impl<T: Entry> Sync for RingBuffer<T> {}

impl<T: Entry> RingBuffer<T> {
    /// Create a ring of at least `size` entries (rounded up to a power of 2),
    /// filled by `factory`.
    pub fn new<F: EntryFactory<T>>(
        factory: F,
        size: usize,
        claim_strategy: ClaimStrategy,
        wait_strategy: WaitStrategy,
    ) -> Result<Self> {
        let config = RingBufferConfig::new(size)?
            .with_claim_strategy(claim_strategy)
            .with_wait_strategy(wait_strategy);
        Self::with_config(factory, config)
    }

    pub fn with_config<F: EntryFactory<T>>(factory: F, config: RingBufferConfig) -> Result<Self> {
        if config.size == 0 || !config.size.is_power_of_two() {
            return Err(DisruptorError::config(
                "Ring buffer size must be a power of 2",
            ));
        }

        let entries = (0..config.size)
            .map(|_| UnsafeCell::new(factory.create()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        trace_debug!(
            "ring buffer created: capacity={} claim={:?} wait={:?}",
            config.size,
            config.claim_strategy,
            config.wait_strategy
        );

        Ok(Self {
            cursor: PaddedSequence::new(INITIAL_CURSOR_VALUE),
            entries,
            mask: config.size - 1,
            claim: ClaimSequencer::new(config.claim_strategy),
            waiter: Waiter::new(config.wait_strategy),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Highest sequence committed so far (-1 before the first commit).
    #[inline]
    pub fn cursor(&self) -> Sequence {
        self.cursor.get()
    }

    pub fn claim_strategy(&self) -> ClaimStrategy {
        self.claim.strategy()
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.waiter.strategy()
    }

    /// Get the entry for `sequence`.
    ///
    /// Only meaningful for a sequence at or below the cursor that no producer
    /// can have re-claimed yet; the ring does not check this. Consumers go
    /// through `ConsumerBarrier::get_entry` after `wait_for`.
    #[inline]
    pub fn get_entry(&self, sequence: Sequence) -> &T {
        // SAFETY: see the claim/commit contract in the module docs.
        unsafe { &*self.slot(sequence).get() }
    }

    /// Mutable access for the producer holding the claim on `sequence`.
    ///
    /// # Safety
    ///
    /// - `sequence` must be claimed by the caller and not yet committed.
    /// - Every tracked consumer must be past `sequence - capacity`.
    #[inline]
    #[allow(clippy::mut_from_ref)] // Exclusive by claim, documented in Safety
    pub(crate) unsafe fn entry_mut(&self, sequence: Sequence) -> &mut T {
        &mut *self.slot(sequence).get()
    }

    #[inline]
    fn slot(&self, sequence: Sequence) -> &UnsafeCell<T> {
        let idx = (sequence as usize) & self.mask;
        debug_assert!(
            idx < self.entries.len(),
            "slot: idx {} >= capacity {}",
            idx,
            self.entries.len()
        );
        &self.entries[idx]
    }

    #[inline]
    pub(crate) fn cursor_sequence(&self) -> &PaddedSequence {
        &self.cursor
    }

    #[inline]
    pub(crate) fn claim(&self) -> &ClaimSequencer {
        &self.claim
    }

    #[inline]
    pub(crate) fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Make `sequence` visible and wake parked consumers. Always the last
    /// step of a commit.
    #[inline]
    pub(crate) fn publish(&self, sequence: Sequence) {
        self.cursor.set(sequence);
        self.waiter.signal_all();
    }

    /// Create a consumer barrier gated on the cursor, or on `consumers` if any.
    pub fn create_consumer_barrier(
        self: &Arc<Self>,
        consumers: Vec<Arc<dyn Consumer>>,
    ) -> ConsumerBarrier<T> {
        ConsumerBarrier::new(self.clone(), consumers)
    }

    /// Create a producer barrier that will not lap `consumers`.
    pub fn create_producer_barrier(
        self: &Arc<Self>,
        consumers: Vec<Arc<dyn Consumer>>,
    ) -> Result<ProducerBarrier<T>> {
        ProducerBarrier::new(self.clone(), consumers)
    }

    /// Create a barrier for filling the ring at explicit sequences when no
    /// other producer exists.
    pub fn create_force_fill_producer_barrier(
        self: &Arc<Self>,
        consumers: Vec<Arc<dyn Consumer>>,
    ) -> Result<ForceFillProducerBarrier<T>> {
        ForceFillProducerBarrier::new(self.clone(), consumers)
    }
}

impl<T: Entry> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor())
            .field("claim_strategy", &self.claim_strategy())
            .field("wait_strategy", &self.wait_strategy())
            .finish()
    }
}
