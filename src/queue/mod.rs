//! # Fixed-capacity reading queue
//!
//! A ring buffer with separate read and write cursors. One slot is always left
//! empty so that a full queue can be told apart from an empty one: a queue of
//! `N` slots holds at most `N - 1` items.
//!
//! The queue never overwrites. When it is full the producer must refuse the new
//! item; readings already waiting are never dropped.
//!
//! ```text
//!   head (read)            tail (write)
//!      │                      │
//!      ▼                      ▼
//! ┌────┬────┬────┬────┬────┬────┬────┬────┐
//! │    │ r0 │ r1 │ r2 │ r3 │    │    │    │
//! └────┴────┴────┴────┴────┴────┴────┴────┘
//! ```
//!
//! Consumers peek at items by their absolute slot index (starting at
//! [`RingQueue::head`] and advancing with [`RingQueue::next_index`]) and release
//! them in one step with [`RingQueue::dequeue`] once they have been delivered.
//!
//! ```rust
//! use subghz_iot::queue::RingQueue;
//!
//! let mut queue: RingQueue<u32, 4> = RingQueue::new();
//! queue.write(10).unwrap();
//! queue.write(20).unwrap();
//!
//! let head = queue.head();
//! assert_eq!(*queue.peek(head).unwrap(), 10);
//! assert_eq!(*queue.peek(queue.next_index(head)).unwrap(), 20);
//!
//! queue.dequeue(2).unwrap();
//! assert!(queue.is_empty());
//! ```

#![deny(unsafe_code)]

use crate::error::Error;

/// Default number of slots of the reading queue.
pub const DEFAULT_QUEUE_LEN: usize = 32;

/// A bounded ring buffer without allocation.
#[derive(Debug)]
pub struct RingQueue<T, const N: usize> {
    slots: [T; N],
    head: usize,
    tail: usize,
}

impl<T: Default, const N: usize> RingQueue<T, N> {
    /// Creates an empty queue.
    ///
    /// `N` must be at least 2, one slot always stays empty:
    ///
    /// ```compile_fail
    /// use subghz_iot::queue::RingQueue;
    ///
    /// let queue: RingQueue<u32, 1> = RingQueue::new();
    /// ```
    pub fn new() -> Self {
        const { assert!(N > 1, "a RingQueue needs at least two slots") };
        Self {
            slots: core::array::from_fn(|_| T::default()),
            head: 0,
            tail: 0,
        }
    }
}

impl<T: Default, const N: usize> Default for RingQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> RingQueue<T, N> {
    /// Maximum number of items the queue can hold.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        if self.tail < self.head {
            N + self.tail - self.head
        } else {
            self.tail - self.head
        }
    }

    /// Returns `true` if the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns `true` if a write would fail.
    pub fn is_full(&self) -> bool {
        self.next_index(self.tail) == self.head
    }

    /// Slot index of the oldest item.
    pub fn head(&self) -> usize {
        self.head
    }

    /// The slot index following `index`.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % N
    }

    /// Appends an item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueFull`] if the queue already holds `N - 1` items; the
    /// queue is left unchanged.
    pub fn write(&mut self, item: T) -> Result<(), Error> {
        let next_tail = self.next_index(self.tail);
        if next_tail == self.head {
            return Err(Error::QueueFull);
        }
        self.slots[self.tail] = item;
        self.tail = next_tail;
        trace!("queue write: head {}, tail {}, len {}", self.head, self.tail, self.len());
        Ok(())
    }

    /// Returns the item stored at slot `index` without removing it.
    ///
    /// # Errors
    ///
    /// * [`Error::QueueEmpty`] if the queue holds no items.
    /// * [`Error::IndexOutOfRange`] if `index` does not address an occupied slot.
    pub fn peek(&self, index: usize) -> Result<&T, Error> {
        if self.is_empty() {
            return Err(Error::QueueEmpty);
        }
        let occupied = if self.head <= self.tail {
            self.head <= index && index < self.tail
        } else {
            index < N && !(self.tail <= index && index < self.head)
        };
        if !occupied {
            return Err(Error::IndexOutOfRange);
        }
        Ok(&self.slots[index])
    }

    /// Releases the `count` oldest items.
    ///
    /// # Errors
    ///
    /// * [`Error::QueueEmpty`] if the queue holds no items.
    /// * [`Error::InvalidArgument`] if `count` is zero or larger than [`len`](Self::len).
    pub fn dequeue(&mut self, count: usize) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::QueueEmpty);
        }
        if count == 0 || count > self.len() {
            return Err(Error::InvalidArgument);
        }
        self.head = (self.head + count) % N;
        trace!("queue dequeue: head {}, tail {}, len {}", self.head, self.tail, self.len());
        Ok(())
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

#[cfg(test)]
mod tests;
