//! Three-Stage Pipeline Example
//!
//! One producer feeds three dependent consumers; each stage only sees an
//! entry once the stage before it is done with it. Latencies from publish to
//! the last stage are recorded in a Histogram.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use kaos_disruptor::affinity::spawn_consumer;
use kaos_disruptor::{
    BatchConsumer, BatchHandler, ClaimStrategy, Consumer, Entry, HandlerError, Histogram,
    RingBuffer, Sequence, WaitStrategy,
};
use parking_lot::Mutex;

const RING_SIZE: usize = 1024 * 32;
const MESSAGE_COUNT: i64 = 1_000_000;

#[derive(Debug, Default)]
struct PriceEntry {
    sequence: Sequence,
    price: i64,
    published_at: Option<Instant>,
    adjusted: AtomicI64,
}

impl Entry for PriceEntry {
    fn sequence(&self) -> Sequence {
        self.sequence
    }
    fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }
}

/// Stage 1: apply a fee
struct Fee;

impl BatchHandler<PriceEntry> for Fee {
    fn on_available(&mut self, entry: &PriceEntry) -> Result<(), HandlerError> {
        entry.adjusted.store(entry.price + 3, Ordering::Relaxed);
        Ok(())
    }
}

/// Stage 2: running total of adjusted prices
struct Total(Arc<AtomicI64>);

impl BatchHandler<PriceEntry> for Total {
    fn on_available(&mut self, entry: &PriceEntry) -> Result<(), HandlerError> {
        self.0
            .fetch_add(entry.adjusted.load(Ordering::Relaxed), Ordering::Relaxed);
        Ok(())
    }
}

/// Stage 3: latency from publish, flushed into the shared histogram per batch
struct Latency {
    local: Histogram,
    shared: Arc<Mutex<Histogram>>,
}

impl BatchHandler<PriceEntry> for Latency {
    fn on_available(&mut self, entry: &PriceEntry) -> Result<(), HandlerError> {
        if let Some(published_at) = entry.published_at {
            self.local
                .add_observation(published_at.elapsed().as_nanos() as i64);
        }
        Ok(())
    }

    fn on_end_of_batch(&mut self) -> Result<(), HandlerError> {
        self.shared.lock().add_observations(&self.local)?;
        self.local.clear();
        Ok(())
    }
}

fn latency_bounds() -> Vec<i64> {
    // Powers of two up to ~1s, then everything else.
    let mut bounds: Vec<i64> = (1..31).map(|shift| 1i64 << shift).collect();
    bounds.push(i64::MAX);
    bounds
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Three-Stage Pipeline Example ===\n");

    let ring = Arc::new(RingBuffer::new(
        PriceEntry::default,
        RING_SIZE,
        ClaimStrategy::SingleThreaded,
        WaitStrategy::Yielding,
    )?);

    let total = Arc::new(AtomicI64::new(0));
    let histogram = Arc::new(Mutex::new(Histogram::new(&latency_bounds())?));

    let fee = Arc::new(BatchConsumer::new(ring.create_consumer_barrier(vec![]), Fee));
    let sum = Arc::new(BatchConsumer::new(
        ring.create_consumer_barrier(vec![fee.clone() as Arc<dyn Consumer>]),
        Total(total.clone()),
    ));
    let latency = Arc::new(BatchConsumer::new(
        ring.create_consumer_barrier(vec![sum.clone() as Arc<dyn Consumer>]),
        Latency {
            local: Histogram::new(&latency_bounds())?,
            shared: histogram.clone(),
        },
    ));
    let producer =
        ring.create_producer_barrier(vec![latency.clone() as Arc<dyn Consumer>])?;

    let handles = vec![
        spawn_consumer("fee", Some(1), fee.clone())?,
        spawn_consumer("total", Some(2), sum.clone())?,
        spawn_consumer("latency", Some(3), latency.clone())?,
    ];

    let start = Instant::now();
    for i in 0..MESSAGE_COUNT {
        let mut entry = producer.next_entry();
        entry.price = i;
        entry.published_at = Some(Instant::now());
        producer.commit(entry);
    }
    while latency.sequence() < ring.cursor() {
        std::hint::spin_loop();
    }
    let duration = start.elapsed();

    fee.halt();
    sum.halt();
    latency.halt();
    for handle in handles {
        if let Err(e) = handle.join().map_err(|_| "consumer thread panicked")? {
            return Err(e.into());
        }
    }

    // Verify
    let expected = MESSAGE_COUNT * (MESSAGE_COUNT - 1) / 2 + 3 * MESSAGE_COUNT;
    assert_eq!(total.load(Ordering::Relaxed), expected, "Sum mismatch!");

    let throughput = MESSAGE_COUNT as f64 / duration.as_secs_f64() / 1_000_000.0;
    println!("Throughput: {:.2}M msgs/sec", throughput);
    println!("Latency (ns): {}", histogram.lock());
    Ok(())
}
