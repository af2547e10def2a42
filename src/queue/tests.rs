use super::*;
use crate::error::Error;

const SLOTS: usize = 8;

fn filled(count: usize) -> RingQueue<u32, SLOTS> {
    let mut queue = RingQueue::new();
    for i in 0..count {
        queue.write(i as u32).unwrap();
    }
    queue
}

#[test]
fn test_new_queue_is_empty() {
    let queue: RingQueue<u32, SLOTS> = RingQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.capacity(), SLOTS - 1);
}

#[test]
fn test_write_until_full() {
    let mut queue = filled(SLOTS - 1);
    assert!(queue.is_full());
    assert_eq!(queue.len(), SLOTS - 1);

    assert_eq!(queue.write(99), Err(Error::QueueFull));
    assert_eq!(queue.len(), SLOTS - 1);
    assert_eq!(*queue.peek(queue.head()).unwrap(), 0);
}

#[test]
fn test_peek_empty() {
    let queue: RingQueue<u32, SLOTS> = RingQueue::new();
    assert_eq!(queue.peek(0), Err(Error::QueueEmpty));
}

#[test]
fn test_peek_outside_occupied_range() {
    let queue = filled(3);
    assert_eq!(*queue.peek(2).unwrap(), 2);
    assert_eq!(queue.peek(3), Err(Error::IndexOutOfRange));
    assert_eq!(queue.peek(SLOTS + 1), Err(Error::IndexOutOfRange));
}

#[test]
fn test_peek_across_wrap() {
    let mut queue = filled(6);
    queue.dequeue(5).unwrap();
    for i in 10..14 {
        queue.write(i).unwrap();
    }
    // head = 5, tail = 2
    assert_eq!(queue.head(), 5);
    assert_eq!(queue.len(), 5);

    let mut index = queue.head();
    let mut seen = [0u32; 5];
    for slot in seen.iter_mut() {
        *slot = *queue.peek(index).unwrap();
        index = queue.next_index(index);
    }
    assert_eq!(seen, [5, 10, 11, 12, 13]);

    assert_eq!(queue.peek(2), Err(Error::IndexOutOfRange));
    assert_eq!(queue.peek(4), Err(Error::IndexOutOfRange));
    assert_eq!(queue.peek(SLOTS), Err(Error::IndexOutOfRange));
}

#[test]
fn test_dequeue_invalid_counts() {
    let mut queue = filled(3);
    assert_eq!(queue.dequeue(0), Err(Error::InvalidArgument));
    assert_eq!(queue.dequeue(4), Err(Error::InvalidArgument));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.head(), 0);
}

#[test]
fn test_dequeue_empty() {
    let mut queue: RingQueue<u32, SLOTS> = RingQueue::new();
    assert_eq!(queue.dequeue(1), Err(Error::QueueEmpty));
}

#[test]
fn test_length_tracks_writes_minus_dequeues() {
    let mut queue: RingQueue<u32, SLOTS> = RingQueue::new();
    let mut written = 0usize;
    let mut released = 0usize;

    // Mixed pattern that wraps the cursors several times.
    let pattern: [(usize, usize); 6] = [(5, 2), (4, 6), (7, 3), (0, 4), (3, 1), (6, 5)];
    for (writes, dequeues) in pattern {
        for _ in 0..writes {
            if queue.write(written as u32).is_ok() {
                written += 1;
            }
        }
        let count = dequeues.min(queue.len());
        if count > 0 {
            queue.dequeue(count).unwrap();
            released += count;
        }
        assert_eq!(queue.len(), written - released);
        assert!(queue.len() <= queue.capacity());
    }
}

#[test]
fn test_clear() {
    let mut queue = filled(4);
    queue.clear();
    assert!(queue.is_empty());
    queue.write(1).unwrap();
    assert_eq!(*queue.peek(0).unwrap(), 1);
}
