//! Entry types and helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use kaos_disruptor::disruptor::PaddedSequence;
use kaos_disruptor::{Consumer, Entry, Sequence};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubEntry {
    pub sequence: Sequence,
    pub value: i64,
}

impl StubEntry {
    pub fn new(value: i64) -> Self {
        Self {
            sequence: -1,
            value,
        }
    }
}

impl Entry for StubEntry {
    fn sequence(&self) -> Sequence {
        self.sequence
    }
    fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }
}

/// Entry whose stage results are written by consumers through `&self`.
#[derive(Debug, Default)]
pub struct FunctionEntry {
    pub sequence: Sequence,
    pub operand_one: i64,
    pub operand_two: i64,
    pub step_one_result: AtomicI64,
    pub step_two_result: AtomicI64,
}

impl Entry for FunctionEntry {
    fn sequence(&self) -> Sequence {
        self.sequence
    }
    fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }
}

/// Consumer whose progress the test moves by hand.
pub struct StubConsumer(pub PaddedSequence);

impl StubConsumer {
    pub fn new(sequence: Sequence) -> Self {
        Self(PaddedSequence::new(sequence))
    }

    pub fn set(&self, sequence: Sequence) {
        self.0.set(sequence);
    }
}

impl Consumer for StubConsumer {
    fn sequence(&self) -> Sequence {
        self.0.get()
    }
    fn halt(&self) {}
}

pub fn wait_until(what: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !what() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        std::thread::yield_now();
    }
}

pub fn load(value: &AtomicI64) -> i64 {
    value.load(Ordering::Acquire)
}
