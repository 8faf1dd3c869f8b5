//! BatchConsumer - the per-thread consumer loop.
//!
//! Waits on its barrier for whatever range is available, hands each entry to
//! a `BatchHandler`, then signals end of batch. Its own sequence is what
//! producers and downstream barriers gate on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::disruptor::barrier::ConsumerBarrier;
use crate::disruptor::consumer::Consumer;
use crate::disruptor::entry::Entry;
use crate::disruptor::padding::PaddedSequence;
use crate::disruptor::{Sequence, INITIAL_CURSOR_VALUE};
use crate::error::{Alerted, DisruptorError, HandlerError, Result};

/// Receives entries from a `BatchConsumer`, in sequence order.
pub trait BatchHandler<T: Entry>: Send {
    fn on_available(&mut self, entry: &T) -> std::result::Result<(), HandlerError>;

    /// Called after the last entry of each available range. A natural point
    /// to flush buffered work.
    fn on_end_of_batch(&mut self) -> std::result::Result<(), HandlerError> {
        Ok(())
    }

    /// Called once when the consumer loop exits after `halt`.
    fn on_completion(&mut self) {}
}

/// Handler that reports its own progress instead of having the consumer
/// advance on every delivered entry.
///
/// Useful when entries are only done once some later asynchronous work
/// completes: producers will not reuse a slot until the handler says so.
pub trait SequenceTrackingHandler<T: Entry>: BatchHandler<T> {
    fn set_sequence_tracker_callback(&mut self, callback: SequenceTrackerCallback);
}

/// Lets a `SequenceTrackingHandler` publish how far it has got.
#[derive(Clone)]
pub struct SequenceTrackerCallback {
    sequence: Arc<PaddedSequence>,
}

impl SequenceTrackerCallback {
    fn new(sequence: Arc<PaddedSequence>) -> Self {
        Self { sequence }
    }

    /// Mark every entry up to and including `sequence` as processed.
    pub fn on_completed(&self, sequence: Sequence) {
        self.sequence.set(sequence);
    }
}

impl fmt::Debug for SequenceTrackerCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SequenceTrackerCallback")
            .field(&self.sequence.get())
            .finish()
    }
}

/// Policy for errors returned by a `BatchHandler`.
pub trait ExceptionHandler<T: Entry>: Send + Sync {
    fn handle(&self, error: &HandlerError, sequence: Sequence, entry: &T);
}

/// Logs then panics, taking the consumer thread down. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct FatalExceptionHandler;

impl<T: Entry> ExceptionHandler<T> for FatalExceptionHandler {
    fn handle(&self, error: &HandlerError, sequence: Sequence, entry: &T) {
        trace_error!(
            "Exception processing: sequence={} entry={:?} error={}",
            sequence,
            entry,
            error
        );
        panic!("Exception processing sequence {}: {}", sequence, error);
    }
}

/// Logs and carries on with the next entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreExceptionHandler;

impl<T: Entry> ExceptionHandler<T> for IgnoreExceptionHandler {
    fn handle(&self, error: &HandlerError, sequence: Sequence, entry: &T) {
        trace_info!(
            "Exception processing: sequence={} entry={:?} error={}",
            sequence,
            entry,
            error
        );
    }
}

/// Runs a `BatchHandler` against a `ConsumerBarrier`.
///
/// `run` blocks the calling thread until `halt`. Share the consumer through
/// an `Arc` so it can be halted from elsewhere and tracked by other barriers.
/// After `run` returns, it may be called again (on any thread) and resumes
/// after the last processed sequence.
pub struct BatchConsumer<T: Entry, H: BatchHandler<T>> {
    sequence: Arc<PaddedSequence>,
    running: AtomicBool,
    halt_requested: AtomicBool,
    barrier: ConsumerBarrier<T>,
    handler: Mutex<H>,
    tracks_sequence: bool,
    exception_handler: Box<dyn ExceptionHandler<T>>,
}

impl<T: Entry, H: BatchHandler<T>> BatchConsumer<T, H> {
    /// Consumer whose sequence advances as each entry is delivered.
    pub fn new(barrier: ConsumerBarrier<T>, handler: H) -> Self {
        Self::build(
            barrier,
            handler,
            Arc::new(PaddedSequence::new(INITIAL_CURSOR_VALUE)),
            false,
        )
    }

    fn build(
        barrier: ConsumerBarrier<T>,
        handler: H,
        sequence: Arc<PaddedSequence>,
        tracks_sequence: bool,
    ) -> Self {
        Self {
            sequence,
            running: AtomicBool::new(false),
            halt_requested: AtomicBool::new(false),
            barrier,
            handler: Mutex::new(handler),
            tracks_sequence,
            exception_handler: Box::new(FatalExceptionHandler),
        }
    }

    /// Replace the default `FatalExceptionHandler`.
    pub fn with_exception_handler<E: ExceptionHandler<T> + 'static>(mut self, handler: E) -> Self {
        self.exception_handler = Box::new(handler);
        self
    }

    pub fn consumer_barrier(&self) -> &ConsumerBarrier<T> {
        &self.barrier
    }

    /// Last sequence processed (-1 before the first).
    pub fn sequence(&self) -> Sequence {
        self.sequence.get()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the loop at the next opportunity, interrupting any wait.
    ///
    /// A halt issued before `run` starts is kept: that `run` returns without
    /// processing anything.
    pub fn halt(&self) {
        self.halt_requested.store(true, Ordering::SeqCst);
        self.barrier.alert();
    }

    /// Process entries until `halt` is called.
    ///
    /// Returns `DisruptorError::AlreadyRunning` if another thread is inside
    /// `run` for this consumer.
    pub fn run(&self) -> Result<()> {
        let Some(mut handler) = self.handler.try_lock() else {
            return Err(DisruptorError::AlreadyRunning);
        };

        self.barrier.clear_alert();
        self.running.store(true, Ordering::Release);
        let _running = RunningGuard(&self.running);

        let mut next = self.sequence.get() + 1;
        trace_debug!("batch consumer started at sequence {}", next);

        while !self.halt_requested.load(Ordering::SeqCst) {
            let available = match self.barrier.wait_for(next) {
                Ok(available) => available,
                // Woken by halt; the loop condition decides.
                Err(Alerted) => continue,
            };

            match self.deliver(&mut handler, next, available) {
                Ok(()) => next = available + 1,
                Err((error, failed)) => {
                    self.exception_handler
                        .handle(&error, failed, self.barrier.get_entry(failed));
                    if !self.tracks_sequence {
                        self.sequence.set(failed);
                    }
                    next = failed + 1;
                }
            }
        }

        self.halt_requested.store(false, Ordering::SeqCst);
        handler.on_completion();
        trace_debug!("batch consumer stopped at sequence {}", self.sequence.get());
        Ok(())
    }

    fn deliver(
        &self,
        handler: &mut H,
        from: Sequence,
        to: Sequence,
    ) -> std::result::Result<(), (HandlerError, Sequence)> {
        for sequence in from..=to {
            handler
                .on_available(self.barrier.get_entry(sequence))
                .map_err(|e| (e, sequence))?;
            if !self.tracks_sequence {
                self.sequence.set(sequence);
            }
        }
        handler.on_end_of_batch().map_err(|e| (e, to))
    }
}

/// Clears the running flag when `run` exits, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Entry, H: SequenceTrackingHandler<T>> BatchConsumer<T, H> {
    /// Consumer whose sequence only advances when `handler` reports it
    /// through its `SequenceTrackerCallback`.
    pub fn with_sequence_tracking(barrier: ConsumerBarrier<T>, mut handler: H) -> Self {
        let sequence = Arc::new(PaddedSequence::new(INITIAL_CURSOR_VALUE));
        handler.set_sequence_tracker_callback(SequenceTrackerCallback::new(sequence.clone()));
        Self::build(barrier, handler, sequence, true)
    }
}

impl<T: Entry, H: BatchHandler<T>> Consumer for BatchConsumer<T, H> {
    fn sequence(&self) -> Sequence {
        BatchConsumer::sequence(self)
    }

    fn halt(&self) {
        BatchConsumer::halt(self)
    }
}

impl<T: Entry, H: BatchHandler<T>> fmt::Debug for BatchConsumer<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConsumer")
            .field("sequence", &self.sequence())
            .field("running", &self.is_running())
            .field("tracks_sequence", &self.tracks_sequence)
            .finish()
    }
}
