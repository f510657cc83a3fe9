//! Fixed-capacity single-producer/single-consumer ring buffer
//!
//! Producer and consumer are each pinned to one context (the foreground
//! loop or one specific interrupt handler). The buffer performs no locking
//! of its own; whenever the opposite endpoint can run, the caller brackets
//! the access in a critical section.
//!
//! One slot is always kept empty so that a full buffer can be told apart
//! from an empty one: a buffer of capacity `N` holds at most `N - 1` live
//! entries.

use core::mem::MaybeUninit;

/// A fixed-capacity FIFO with modular head/tail indices.
pub struct RingBuffer<T, const N: usize> {
    buf: [MaybeUninit<T>; N],
    head: usize,
    tail: usize,
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    /// Creates an empty ring buffer.
    pub const fn new() -> Self {
        assert!(N >= 2, "a ring buffer needs at least one usable slot");
        Self {
            // An array of MaybeUninit needs no initialization.
            buf: unsafe { MaybeUninit::uninit().assume_init() },
            head: 0,
            tail: 0,
        }
    }

    /// Returns true if no entries are queued.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns true if pushing another entry would overrun the reserved
    /// slot.
    pub fn is_full(&self) -> bool {
        (self.tail + 1) % N == self.head
    }

    /// Appends `value`, or hands it back if the buffer is full.
    ///
    /// Callers on the lossy paths (IR and UART overload) drop the returned
    /// value on the floor.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.buf[self.tail] = MaybeUninit::new(value);
        self.tail = (self.tail + 1) % N;
        Ok(())
    }

    /// Removes and returns the oldest entry.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // Every slot between head and tail was written by push.
        let value = unsafe { self.buf[self.head].assume_init() };
        self.head = (self.head + 1) % N;
        Some(value)
    }
}

impl<T: Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[test]
    fn starts_empty() {
        let ring: RingBuffer<u16, 4> = RingBuffer::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());
    }

    #[test]
    fn holds_capacity_minus_one() {
        let mut ring: RingBuffer<u16, 4> = RingBuffer::new();
        assert!(ring.push(1).is_ok());
        assert!(ring.push(2).is_ok());
        assert!(ring.push(3).is_ok());
        assert!(ring.is_full());
        assert_eq!(ring.push(4), Err(4));
    }

    #[test]
    fn fifo_order() {
        let mut ring: RingBuffer<u16, 4> = RingBuffer::new();
        ring.push(10).unwrap();
        ring.push(20).unwrap();
        assert_eq!(ring.pop(), Some(10));
        ring.push(30).unwrap();
        ring.push(40).unwrap();
        assert_eq!(ring.pop(), Some(20));
        assert_eq!(ring.pop(), Some(30));
        assert_eq!(ring.pop(), Some(40));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn overflow_drops_new_value_only() {
        let mut ring: RingBuffer<u16, 4> = RingBuffer::new();
        for v in [1, 2, 3] {
            ring.push(v).unwrap();
        }
        // The rejected push must not disturb the queued entries.
        assert!(ring.push(99).is_err());
        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn indices_wrap_around() {
        let mut ring: RingBuffer<u16, 4> = RingBuffer::new();
        for round in 0..32u16 {
            ring.push(round).unwrap();
            assert_eq!(ring.pop(), Some(round));
        }
        assert!(ring.is_empty());
    }

    proptest! {
        // Conservation against a model queue: for any interleaving of pushes
        // and pops, at most N-1 entries are live, values come back in push
        // order, and full and empty are never observed together.
        #[test]
        fn matches_model_queue(ops in proptest::collection::vec(any::<Option<u16>>(), 0..256)) {
            let mut ring: RingBuffer<u16, 8> = RingBuffer::new();
            let mut model: VecDeque<u16> = VecDeque::new();

            for op in ops {
                match op {
                    Some(v) => {
                        if ring.push(v).is_ok() {
                            model.push_back(v);
                        } else {
                            prop_assert_eq!(model.len(), 7);
                        }
                    }
                    None => {
                        prop_assert_eq!(ring.pop(), model.pop_front());
                    }
                }
                prop_assert!(model.len() <= 7);
                prop_assert_eq!(ring.is_empty(), model.is_empty());
                prop_assert_eq!(ring.is_full(), model.len() == 7);
                prop_assert!(!(ring.is_full() && ring.is_empty()));
            }

            // Drain and compare the tails.
            while let Some(v) = ring.pop() {
                prop_assert_eq!(Some(v), model.pop_front());
            }
            prop_assert!(model.is_empty());
        }
    }
}
