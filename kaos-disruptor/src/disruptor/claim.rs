//! Strategies producers use to claim sequences.
//!
//! The claimed sequence runs ahead of the cursor: a slot is claimed, written,
//! then committed. The claim counter therefore always satisfies
//! `claimed >= cursor`.

use crate::disruptor::padding::PaddedSequence;
use crate::disruptor::Sequence;

/// Threading policy for producers claiming entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimStrategy {
    /// Exactly one producer thread. Claiming is a plain increment and commit
    /// order is claim order by construction.
    #[default]
    SingleThreaded,
    /// Any number of producer threads. Claiming is an atomic increment and
    /// each commit waits for the previous sequence to be published first.
    MultiThreaded,
}

/// Claim counter for a ring buffer, driven by its `ClaimStrategy`.
#[derive(Debug)]
pub struct ClaimSequencer {
    strategy: ClaimStrategy,
    next: PaddedSequence,
}

impl ClaimSequencer {
    pub fn new(strategy: ClaimStrategy) -> Self {
        Self {
            strategy,
            next: PaddedSequence::new(0),
        }
    }

    pub fn strategy(&self) -> ClaimStrategy {
        self.strategy
    }

    /// Claim the next sequence and advance the counter. The first claim is 0.
    #[inline]
    pub fn claim_next(&self) -> Sequence {
        match self.strategy {
            ClaimStrategy::SingleThreaded => {
                // Only one writer: no read-modify-write needed.
                let sequence = self.next.get();
                self.next.set(sequence + 1);
                sequence
            }
            ClaimStrategy::MultiThreaded => self.next.get_and_add(1),
        }
    }

    /// Set the next sequence to be claimed.
    pub fn set_sequence(&self, sequence: Sequence) {
        self.next.set(sequence);
    }

    /// Wait until `cursor` has reached `sequence`.
    ///
    /// No-op for a single producer. For multiple producers this spins until
    /// the cursor equals `sequence`, serializing commits into claim order.
    /// The spin is not cancellable: once a sequence is claimed, every
    /// earlier claim must be committed before this one can be.
    #[inline]
    pub fn wait_for_cursor(&self, sequence: Sequence, cursor: &PaddedSequence) {
        if self.strategy == ClaimStrategy::MultiThreaded {
            while cursor.get() != sequence {
                std::hint::spin_loop();
            }
        }
    }
}
