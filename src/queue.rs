//! Bounded single-producer/single-consumer report queue.
//!
//! A thin wrapper over an `rtrb` ring buffer. [`bounded`] hands out exactly
//! one [`Producer`] and one [`Consumer`]; neither is `Clone` and both
//! mutate through `&mut self`, so the single-producer/single-consumer
//! discipline is enforced by the type system.
//!
//! A queue of capacity `N` holds at most `N - 1` reports; one slot is
//! reserved the way a classic head/tail ring keeps `head == tail` for
//! empty. Pushing into a full queue drops the new report, counts the drop
//! and leaves the queued reports untouched.
//!
//! # Example
//!
//! ```
//! use inputloop::queue;
//!
//! let (mut tx, mut rx) = queue::bounded::<u32, 4>();
//! assert!(tx.push(1));
//! assert!(tx.push(2));
//! assert!(tx.push(3));
//! assert!(!tx.push(4)); // full: capacity - 1 slots are usable
//!
//! assert_eq!(rx.pop(), Some(1));
//! assert_eq!(rx.pop(), Some(2));
//! assert_eq!(rx.pop(), Some(3));
//! assert_eq!(rx.pop(), None);
//! ```

use rtrb::RingBuffer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of slots in each report queue.
pub const QUEUE_CAPACITY: usize = 32;

/// Create a queue with `N` slots and split it into its two halves.
pub fn bounded<T: Copy, const N: usize>() -> (Producer<T>, Consumer<T>) {
    const { assert!(N >= 2, "a queue needs at least two slots") };

    let (producer, consumer) = RingBuffer::new(N - 1);
    let dropped = Arc::new(AtomicU64::new(0));

    (
        Producer {
            inner: producer,
            dropped: Arc::clone(&dropped),
        },
        Consumer {
            inner: consumer,
            dropped,
        },
    )
}

/// Create a queue with the standard [`QUEUE_CAPACITY`].
pub fn channel<T: Copy>() -> (Producer<T>, Consumer<T>) {
    bounded::<T, QUEUE_CAPACITY>()
}

/// Writing half of a queue. Lives in the capture context.
pub struct Producer<T> {
    inner: rtrb::Producer<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: Copy> Producer<T> {
    /// Append a report.
    ///
    /// Returns `false` if the queue is full; the report is discarded and
    /// the drop counter advances. Never blocks and never allocates.
    #[inline]
    pub fn push(&mut self, report: T) -> bool {
        match self.inner.push(report) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Number of reports dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Reading half of a queue. Lives on the replay thread.
pub struct Consumer<T> {
    inner: rtrb::Consumer<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: Copy> Consumer<T> {
    /// Take the oldest report, or `None` if the queue is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop().ok()
    }

    /// Whether no report is currently available.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of the number of queued reports.
    pub fn len(&self) -> usize {
        self.inner.slots()
    }

    /// Number of reports dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T: Copy> Iterator for Consumer<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MouseReport;
    use std::thread;

    fn movement(timestamp: u32) -> MouseReport {
        MouseReport {
            dx: 1,
            timestamp,
            ..Default::default()
        }
    }

    #[test]
    fn test_fifo_round_trip() {
        let (mut tx, mut rx) = channel::<MouseReport>();
        assert!(rx.is_empty());

        for t in 0..10 {
            assert!(tx.push(movement(t)));
        }
        assert_eq!(rx.len(), 10);

        let drained: Vec<u32> = rx.by_ref().map(|r| r.timestamp).collect();
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_full_queue_rejects_without_overwrite() {
        let (mut tx, mut rx) = bounded::<u32, 4>();
        assert!(tx.push(10));
        assert!(tx.push(20));
        assert!(tx.push(30));

        assert!(!tx.push(40));
        assert!(!tx.push(50));
        assert_eq!(tx.dropped(), 2);

        assert_eq!(rx.pop(), Some(10));
        assert_eq!(rx.pop(), Some(20));
        assert_eq!(rx.pop(), Some(30));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_forty_pushes_without_draining() {
        let (mut tx, mut rx) = channel::<MouseReport>();

        let accepted: Vec<bool> = (1..=40).map(|t| tx.push(movement(t))).collect();
        assert!(accepted[..31].iter().all(|ok| *ok));
        assert!(accepted[31..].iter().all(|ok| !ok));
        assert_eq!(accepted.len() - 31, 9);
        assert_eq!(rx.dropped(), 9);

        let drained: Vec<u32> = rx.by_ref().map(|r| r.timestamp).collect();
        assert_eq!(drained, (1..=31).collect::<Vec<_>>());
    }

    #[test]
    fn test_drop_counter_shared_and_space_reclaimed() {
        let (mut tx, mut rx) = bounded::<u32, 2>();
        assert!(tx.push(1));
        assert!(!tx.push(2));
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.dropped(), 1);
        assert_eq!(rx.len(), 1);

        assert_eq!(rx.pop(), Some(1));
        assert!(tx.push(3));
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.dropped(), 1);
    }

    #[test]
    fn test_wraparound_reuses_slots() {
        let (mut tx, mut rx) = bounded::<u32, 4>();
        for round in 0..20u32 {
            assert!(tx.push(round * 2));
            assert!(tx.push(round * 2 + 1));
            assert_eq!(rx.pop(), Some(round * 2));
            assert_eq!(rx.pop(), Some(round * 2 + 1));
        }
        assert!(rx.is_empty());
        assert_eq!(rx.len(), 0);
    }

    #[test]
    fn test_cross_thread_order_is_preserved() {
        let (mut tx, mut rx) = channel::<u32>();
        const TOTAL: u32 = 10_000;

        let producer = thread::spawn(move || {
            let mut next = 0;
            while next < TOTAL {
                if tx.push(next) {
                    next += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0;
        while expected < TOTAL {
            match rx.pop() {
                Some(value) => {
                    assert_eq!(value, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert!(rx.is_empty());
    }
}
