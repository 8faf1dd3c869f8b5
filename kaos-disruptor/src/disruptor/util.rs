//! Small helpers shared by the ring and the barriers.

use std::sync::Arc;

use crate::disruptor::consumer::Consumer;
use crate::disruptor::Sequence;

/// Smallest power of two `>= x` (1 for 0 and 1).
pub fn ceiling_next_power_of_two(x: usize) -> usize {
    x.max(1).next_power_of_two()
}

/// Minimum sequence across `consumers`, or `Sequence::MAX` if there are none.
#[inline]
pub fn minimum_sequence(consumers: &[Arc<dyn Consumer>]) -> Sequence {
    consumers
        .iter()
        .map(|c| c.sequence())
        .min()
        .unwrap_or(Sequence::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disruptor::padding::PaddedSequence;

    struct FixedConsumer(PaddedSequence);

    impl Consumer for FixedConsumer {
        fn sequence(&self) -> Sequence {
            self.0.get()
        }
        fn halt(&self) {}
    }

    #[test]
    fn test_ceiling_next_power_of_two() {
        assert_eq!(ceiling_next_power_of_two(0), 1);
        assert_eq!(ceiling_next_power_of_two(1), 1);
        assert_eq!(ceiling_next_power_of_two(20), 32);
        assert_eq!(ceiling_next_power_of_two(1000), 1024);
        assert_eq!(ceiling_next_power_of_two(1024), 1024);
        assert_eq!(ceiling_next_power_of_two(1025), 2048);
    }

    #[test]
    fn test_minimum_sequence() {
        let consumers: Vec<Arc<dyn Consumer>> = vec![
            Arc::new(FixedConsumer(PaddedSequence::new(7))),
            Arc::new(FixedConsumer(PaddedSequence::new(3))),
            Arc::new(FixedConsumer(PaddedSequence::new(12))),
        ];
        assert_eq!(minimum_sequence(&consumers), 3);
    }

    #[test]
    fn test_minimum_sequence_empty() {
        assert_eq!(minimum_sequence(&[]), Sequence::MAX);
    }
}
