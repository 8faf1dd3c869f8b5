//! Ring buffer with barriers (LMAX Disruptor pattern).
//!
//! - `RingBuffer<T>` - pre-allocated entries, published cursor
//! - `ProducerBarrier<T>` - claim, write, commit; never laps tracked consumers
//! - `ForceFillProducerBarrier<T>` - write at a specific sequence (pre-fill)
//! - `ConsumerBarrier<T>` - wait for the cursor or upstream consumers
//! - `BatchConsumer<T, H>` - per-thread loop delivering entries to a handler
//!
//! ```text
//!                   track to prevent wrap
//!          +------------------------------------------------+
//!          |                                                v
//! P0 --> [PB] --> [RB] <-- [CB0] <-- C0 <-- [CB1] <-- C1 <-- [CB2] <-- C2
//! ```

mod barrier;
mod batch;
mod claim;
mod consumer;
mod entry;
mod padding;
mod producer;
mod ring_buffer;
pub mod util;
mod wait;

// Re-exports
pub use barrier::ConsumerBarrier;
pub use batch::{
    BatchConsumer, BatchHandler, ExceptionHandler, FatalExceptionHandler, IgnoreExceptionHandler,
    SequenceTrackerCallback, SequenceTrackingHandler,
};
pub use claim::{ClaimSequencer, ClaimStrategy};
pub use consumer::{Consumer, NoOpConsumer};
pub use entry::{Entry, EntryFactory, EntryTranslator};
pub use padding::{PaddedSequence, PADDED_SIZE};
pub use producer::{ClaimedEntry, ForceFillProducerBarrier, ProducerBarrier};
pub use ring_buffer::RingBuffer;
pub use wait::{WaitStrategy, Waiter};

use crate::error::{DisruptorError, Result};

/// Default ring buffer size
const DEFAULT_RING_BUFFER_SIZE: usize = 1024;

/// Sequence number type for ring buffer positions
pub type Sequence = i64;

/// Cursor and consumer sequences start here: nothing published or consumed.
pub const INITIAL_CURSOR_VALUE: Sequence = -1;

/// Configuration for ring buffer behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingBufferConfig {
    /// Number of entries (always a power of 2)
    pub size: usize,
    /// How producers claim sequences
    pub claim_strategy: ClaimStrategy,
    /// How consumers wait for sequences
    pub wait_strategy: WaitStrategy,
}

impl Default for RingBufferConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_RING_BUFFER_SIZE,
            claim_strategy: ClaimStrategy::default(),
            wait_strategy: WaitStrategy::default(),
        }
    }
}

impl RingBufferConfig {
    /// Create a new configuration, rounding `size` up to the next power of 2
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(DisruptorError::config(
                "Ring buffer size must be greater than 0",
            ));
        }

        Ok(Self {
            size: util::ceiling_next_power_of_two(size),
            ..Default::default()
        })
    }

    pub fn with_claim_strategy(mut self, claim_strategy: ClaimStrategy) -> Self {
        self.claim_strategy = claim_strategy;
        self
    }

    pub fn with_wait_strategy(mut self, wait_strategy: WaitStrategy) -> Self {
        self.wait_strategy = wait_strategy;
        self
    }
}
