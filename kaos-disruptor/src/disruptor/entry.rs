//! Entries exchanged through the ring, and the traits that create and fill them.

use std::fmt::Debug;

use crate::disruptor::Sequence;

/// Trait for objects that can be stored in the ring buffer.
///
/// Entries are allocated once when the ring is built and reused every
/// `capacity` sequences. The producer barrier stamps the sequence just
/// before handing the entry out for writing.
pub trait Entry: Debug + Send + Sync + 'static {
    /// Get the sequence number of this entry
    fn sequence(&self) -> Sequence;

    /// Set the sequence number of this entry
    fn set_sequence(&mut self, sequence: Sequence);
}

/// Creates the entries that pre-fill a ring buffer.
pub trait EntryFactory<T: Entry> {
    fn create(&self) -> T;
}

impl<T: Entry, F: Fn() -> T> EntryFactory<T> for F {
    fn create(&self) -> T {
        self()
    }
}

/// Translates some other data representation into a claimed entry.
pub trait EntryTranslator<T: Entry> {
    fn translate_to(&self, entry: &mut T);
}

impl<T: Entry, F: Fn(&mut T)> EntryTranslator<T> for F {
    fn translate_to(&self, entry: &mut T) {
        self(entry)
    }
}
