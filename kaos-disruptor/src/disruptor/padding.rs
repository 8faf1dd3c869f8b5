//! Cache-line padded sequence counter (prevents false sharing).
//!
//! The cursor and every consumer sequence are written by different threads.
//! Each lives in its own `PaddedSequence` so that an update to one never
//! invalidates the cache line holding another.
//!
//! The block is 128 bytes with the value in the second half: the value's
//! own line holds nothing else, and the line before it is padding, which
//! keeps adjacent-line prefetchers from pairing it with a neighbour.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::disruptor::{Sequence, INITIAL_CURSOR_VALUE};

/// Bytes a padded counter occupies.
pub const PADDED_SIZE: usize = 128;

const CACHE_LINE_SIZE: usize = 64;

/// A 64-bit sequence counter that owns a full (double) cache line.
///
/// All accesses are `SeqCst`, so call sites never need a separate fence to
/// publish the entry writes that precede a `set`.
#[repr(C, align(128))]
pub struct PaddedSequence {
    _pad_before: [u8; CACHE_LINE_SIZE],
    value: AtomicI64,
    _pad_after: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>()],
}

impl PaddedSequence {
    pub const fn new(initial: Sequence) -> Self {
        Self {
            _pad_before: [0; CACHE_LINE_SIZE],
            value: AtomicI64::new(initial),
            _pad_after: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>()],
        }
    }

    #[inline]
    pub fn get(&self) -> Sequence {
        self.value.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn set(&self, value: Sequence) {
        self.value.store(value, Ordering::SeqCst)
    }

    /// Atomically add `delta`, returning the previous value.
    #[inline]
    pub fn get_and_add(&self, delta: i64) -> Sequence {
        self.value.fetch_add(delta, Ordering::SeqCst)
    }
}

impl std::fmt::Debug for PaddedSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PaddedSequence").field(&self.get()).finish()
    }
}

impl Default for PaddedSequence {
    fn default() -> Self {
        Self::new(INITIAL_CURSOR_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_layout_owns_cache_line() {
        assert_eq!(std::mem::size_of::<PaddedSequence>(), PADDED_SIZE);
        assert_eq!(std::mem::align_of::<PaddedSequence>(), PADDED_SIZE);

        // Value sits a full line in, and the next counter's value a full
        // block later.
        let pair = [PaddedSequence::new(0), PaddedSequence::new(0)];
        let base = &pair[0] as *const _ as usize;
        let a = &pair[0].value as *const _ as usize;
        let b = &pair[1].value as *const _ as usize;
        assert_eq!(a - base, 64);
        assert_eq!(b - a, PADDED_SIZE);
    }

    #[test]
    fn test_default_is_initial_cursor() {
        assert_eq!(PaddedSequence::default().get(), -1);
    }

    #[test]
    fn test_get_set() {
        let seq = PaddedSequence::new(3);
        assert_eq!(seq.get(), 3);
        seq.set(42);
        assert_eq!(seq.get(), 42);
        assert_eq!(seq.get_and_add(1), 42);
        assert_eq!(seq.get(), 43);
    }

    #[test]
    fn test_concurrent_get_and_add() {
        let seq = Arc::new(PaddedSequence::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        seq.get_and_add(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seq.get(), 8000);
    }
}
