//! Kaos Disruptor - ring buffer messaging between threads
//!
//! Producers claim and commit pre-allocated entries; chains of batch
//! consumers process them in sequence order, each stage gated on the one
//! before it. No locks on the hot path unless the blocking wait strategy is
//! chosen.
//!
//! ```rust,ignore
//! let ring = Arc::new(RingBuffer::new(ValueEntry::default, 1024,
//!     ClaimStrategy::SingleThreaded, WaitStrategy::Yielding)?);
//! let consumer = Arc::new(BatchConsumer::new(ring.create_consumer_barrier(vec![]), handler));
//! let producer = ring.create_producer_barrier(vec![consumer.clone()])?;
//! producer.publish_with(|e| e.value = 42);
//! ```

// Logging shims, compiled out without the `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! trace_debug { ($($arg:tt)*) => { tracing::debug!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug { ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } } }

#[cfg(feature = "tracing")]
macro_rules! trace_info { ($($arg:tt)*) => { tracing::info!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_info { ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } } }

#[cfg(feature = "tracing")]
macro_rules! trace_warn { ($($arg:tt)*) => { tracing::warn!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn { ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } } }

#[cfg(feature = "tracing")]
macro_rules! trace_error { ($($arg:tt)*) => { tracing::error!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_error { ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } } }

pub mod affinity;
pub mod disruptor;
pub mod error;
pub mod histogram;

// Re-export main components
pub use disruptor::{
    BatchConsumer, BatchHandler, ClaimStrategy, Consumer, ConsumerBarrier, Entry,
    ForceFillProducerBarrier, ProducerBarrier, RingBuffer, RingBufferConfig, Sequence,
    WaitStrategy,
};
pub use error::{Alerted, DisruptorError, HandlerError, Result};
pub use histogram::Histogram;
