//! Loom models of the claim/commit protocol.
//!
//! Slots are loom `UnsafeCell`s, so any read that is not ordered after the
//! write through the cursor (or any overwrite not ordered after the read
//! through the consumer sequence) fails the model.
//!
//! Run with: RUSTFLAGS="--cfg loom" cargo test --test loom_sequencing --release

#[cfg(loom)]
mod loom_tests {
    use loom::cell::UnsafeCell;
    use loom::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use loom::sync::Arc;
    use loom::thread;

    const CAPACITY: i64 = 2;

    struct Ring {
        cursor: AtomicI64,
        claim: AtomicI64,
        consumer: AtomicI64,
        slots: [UnsafeCell<i64>; CAPACITY as usize],
    }

    // Slot access is ordered by the cursor and consumer sequence.
    unsafe impl Sync for Ring {}

    impl Ring {
        fn new() -> Self {
            Self {
                cursor: AtomicI64::new(-1),
                claim: AtomicI64::new(0),
                consumer: AtomicI64::new(-1),
                slots: [UnsafeCell::new(0), UnsafeCell::new(0)],
            }
        }

        fn slot(&self, sequence: i64) -> &UnsafeCell<i64> {
            &self.slots[(sequence & (CAPACITY - 1)) as usize]
        }

        fn write(&self, sequence: i64, value: i64) {
            while sequence - self.consumer.load(Ordering::SeqCst) >= CAPACITY {
                thread::yield_now();
            }
            self.slot(sequence).with_mut(|slot| unsafe { *slot = value });
        }

        /// Read `count` entries in order, advancing the consumer sequence.
        fn consume(&self, count: i64) -> i64 {
            let mut sum = 0;
            let mut next = 0;
            while next < count {
                let available = self.cursor.load(Ordering::SeqCst);
                if available < next {
                    thread::yield_now();
                    continue;
                }
                while next <= available {
                    sum += self.slot(next).with(|slot| unsafe { *slot });
                    self.consumer.store(next, Ordering::SeqCst);
                    next += 1;
                }
            }
            sum
        }
    }

    /// Two producers claim concurrently; commits still land in claim order.
    #[test]
    fn test_multi_producer_commit_order() {
        loom::model(|| {
            let ring = Arc::new(Ring::new());

            let producers: Vec<_> = (0..2)
                .map(|p| {
                    let ring = ring.clone();
                    thread::spawn(move || {
                        let sequence = ring.claim.fetch_add(1, Ordering::SeqCst);
                        ring.write(sequence, 10 + p);
                        while ring.cursor.load(Ordering::SeqCst) != sequence - 1 {
                            thread::yield_now();
                        }
                        ring.cursor.store(sequence, Ordering::SeqCst);
                    })
                })
                .collect();

            let sum = ring.consume(2);

            for producer in producers {
                producer.join().unwrap();
            }
            assert_eq!(sum, 21);
            assert_eq!(ring.cursor.load(Ordering::SeqCst), 1);
        });
    }

    /// A single producer laps a small ring only behind the consumer.
    #[test]
    fn test_back_pressure_prevents_overwrite() {
        loom::model(|| {
            let ring = Arc::new(Ring::new());

            let producer = {
                let ring = ring.clone();
                thread::spawn(move || {
                    for sequence in 0..3 {
                        ring.write(sequence, sequence);
                        ring.cursor.store(sequence, Ordering::SeqCst);
                    }
                })
            };

            let sum = ring.consume(3);

            producer.join().unwrap();
            assert_eq!(sum, 3);
            assert_eq!(ring.consumer.load(Ordering::SeqCst), 2);
        });
    }

    /// Alert ends a wait whose target the cursor never reaches.
    #[test]
    fn test_alert_ends_wait() {
        loom::model(|| {
            let ring = Arc::new(Ring::new());
            let alerted = Arc::new(AtomicBool::new(false));

            let waiter = {
                let ring = ring.clone();
                let alerted = alerted.clone();
                thread::spawn(move || loop {
                    if alerted.load(Ordering::SeqCst) {
                        return None;
                    }
                    let available = ring.cursor.load(Ordering::SeqCst);
                    if available >= 1 {
                        return Some(available);
                    }
                    thread::yield_now();
                })
            };

            ring.write(0, 7);
            ring.cursor.store(0, Ordering::SeqCst);
            alerted.store(true, Ordering::SeqCst);

            assert_eq!(waiter.join().unwrap(), None);
        });
    }
}
