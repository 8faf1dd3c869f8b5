//! Strategies consumers use to wait for a sequence to become available.
//!
//! - `Blocking` - mutex + condvar, lowest CPU, highest latency
//! - `Yielding` - poll with `thread::yield_now()` between checks
//! - `BusySpin` - tight poll, lowest latency, burns a core (pin the thread)
//!
//! All three share one shape: with no upstream consumers the target is the
//! ring cursor, otherwise it is the minimum sequence of the upstream
//! consumers. The alert flag is checked on every iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::disruptor::consumer::Consumer;
use crate::disruptor::padding::PaddedSequence;
use crate::disruptor::util::minimum_sequence;
use crate::disruptor::Sequence;
use crate::error::Alerted;

/// Waiting policy for consumers of a ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    Blocking,
    #[default]
    Yielding,
    BusySpin,
}

/// Runtime state of a `WaitStrategy`, owned by the ring buffer.
pub enum Waiter {
    Blocking { lock: Mutex<()>, signal: Condvar },
    Yielding,
    BusySpin,
}

impl Waiter {
    pub fn new(strategy: WaitStrategy) -> Self {
        match strategy {
            WaitStrategy::Blocking => Waiter::Blocking {
                lock: Mutex::new(()),
                signal: Condvar::new(),
            },
            WaitStrategy::Yielding => Waiter::Yielding,
            WaitStrategy::BusySpin => Waiter::BusySpin,
        }
    }

    pub fn strategy(&self) -> WaitStrategy {
        match self {
            Waiter::Blocking { .. } => WaitStrategy::Blocking,
            Waiter::Yielding => WaitStrategy::Yielding,
            Waiter::BusySpin => WaitStrategy::BusySpin,
        }
    }

    /// Wait until `sequence` is available.
    ///
    /// Returns the highest available sequence, which may be greater than the
    /// one requested. With a `timeout`, returns the last observed sequence
    /// (possibly still behind `sequence`) once the timeout expires.
    pub fn wait_for(
        &self,
        sequence: Sequence,
        cursor: &PaddedSequence,
        dependents: &[Arc<dyn Consumer>],
        alert: &AtomicBool,
        timeout: Option<Duration>,
    ) -> Result<Sequence, Alerted> {
        let deadline = timeout.map(|t| Instant::now() + t);
        match self {
            Waiter::Blocking { lock, signal } => {
                let mut available = cursor.get();
                if available < sequence {
                    let mut guard = lock.lock();
                    loop {
                        if alert.load(Ordering::Acquire) {
                            return Err(Alerted);
                        }
                        available = cursor.get();
                        if available >= sequence {
                            break;
                        }
                        match deadline {
                            Some(deadline) => {
                                if signal.wait_until(&mut guard, deadline).timed_out() {
                                    available = cursor.get();
                                    break;
                                }
                            }
                            None => signal.wait(&mut guard),
                        }
                    }
                }

                if dependents.is_empty() {
                    return Ok(available);
                }
                // Past the deadline this reads the dependents once and returns.
                poll(sequence, cursor, dependents, alert, deadline, std::hint::spin_loop)
            }
            Waiter::Yielding => poll(
                sequence,
                cursor,
                dependents,
                alert,
                deadline,
                std::thread::yield_now,
            ),
            Waiter::BusySpin => poll(
                sequence,
                cursor,
                dependents,
                alert,
                deadline,
                std::hint::spin_loop,
            ),
        }
    }

    /// Wake every consumer parked on this strategy.
    ///
    /// Only the blocking strategy parks; the polling strategies observe the
    /// cursor on their next iteration.
    pub fn signal_all(&self) {
        if let Waiter::Blocking { lock, signal } = self {
            // Taking the lock orders this notify after any waiter's check of
            // the cursor, so a wakeup is never lost.
            let _guard = lock.lock();
            signal.notify_all();
        }
    }
}

impl std::fmt::Debug for Waiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Waiter").field(&self.strategy()).finish()
    }
}

#[inline]
fn poll(
    sequence: Sequence,
    cursor: &PaddedSequence,
    dependents: &[Arc<dyn Consumer>],
    alert: &AtomicBool,
    deadline: Option<Instant>,
    backoff: impl Fn(),
) -> Result<Sequence, Alerted> {
    loop {
        if alert.load(Ordering::Acquire) {
            return Err(Alerted);
        }

        let available = if dependents.is_empty() {
            cursor.get()
        } else {
            minimum_sequence(dependents)
        };
        if available >= sequence {
            return Ok(available);
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Ok(available);
            }
        }
        backoff();
    }
}
