//! Error types for kaos-disruptor.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DisruptorError>;

/// Failure raised by user handler code, routed to an `ExceptionHandler`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DisruptorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Batch consumer is already running")]
    AlreadyRunning,
}

impl DisruptorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Cooperative cancellation raised by `ConsumerBarrier::alert`.
///
/// Not a failure: a waiting consumer gets this instead of a sequence so it
/// can re-check whether it should keep running.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Consumer barrier alerted")]
pub struct Alerted;
