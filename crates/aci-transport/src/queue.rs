// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity circular frame queue.
//!
//! `head == tail` means empty and `(tail + 1) % N == head` means full, so one
//! slot always stays unused and a queue of capacity `N` holds `N - 1` frames.
//!
//! Every operation runs inside `critical_section::with`. The same code serves
//! the application context and the ready-line handler; the critical section
//! keeps either side from seeing the other's half-finished index update.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::frame::Frame;

struct Ring<const N: usize> {
    slots: [Frame; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> Ring<N> {
    const fn new() -> Self {
        Self {
            slots: [Frame::EMPTY; N],
            head: 0,
            tail: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        (self.tail + 1) % N == self.head
    }

    fn len(&self) -> usize {
        (self.tail + N - self.head) % N
    }
}

/// Circular queue of frames shared between execution contexts
pub struct FrameQueue<const N: usize> {
    ring: Mutex<RefCell<Ring<N>>>,
}

impl<const N: usize> FrameQueue<N> {
    const CAPACITY_OK: () = assert!(N >= 2, "FrameQueue needs at least two slots");

    /// Empty queue; `const` so it can live in a `static`
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            ring: Mutex::new(RefCell::new(Ring::new())),
        }
    }

    /// Reset to empty and clear the slots
    pub fn init(&self) {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            ring.head = 0;
            ring.tail = 0;
            ring.slots = [Frame::EMPTY; N];
        });
    }

    /// Copy `frame` into the tail slot
    ///
    /// Returns `false` and leaves the queue untouched when full.
    pub fn enqueue(&self, frame: &Frame) -> bool {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.is_full() {
                return false;
            }
            let tail = ring.tail;
            ring.slots[tail] = *frame;
            ring.tail = (tail + 1) % N;
            true
        })
    }

    /// Copy the head frame out and advance
    pub fn dequeue(&self) -> Option<Frame> {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.is_empty() {
                return None;
            }
            let head = ring.head;
            let frame = ring.slots[head];
            ring.head = (head + 1) % N;
            Some(frame)
        })
    }

    /// Copy the head frame out without advancing
    pub fn peek(&self) -> Option<Frame> {
        critical_section::with(|cs| {
            let ring = self.ring.borrow_ref(cs);
            if ring.is_empty() {
                None
            } else {
                Some(ring.slots[ring.head])
            }
        })
    }

    /// True when `N - 1` frames are queued
    pub fn is_full(&self) -> bool {
        critical_section::with(|cs| self.ring.borrow_ref(cs).is_full())
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.ring.borrow_ref(cs).is_empty())
    }

    /// Frames currently queued
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).len())
    }

    /// Slot count `N`
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Frames the queue can hold, `N - 1`
    pub const fn usable_capacity(&self) -> usize {
        N - 1
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> Frame {
        Frame::from_payload(&[tag]).unwrap()
    }

    #[test]
    fn test_new_queue_is_empty() {
        let q: FrameQueue<4> = FrameQueue::new();
        assert!(q.is_empty());
        assert!(!q.is_full());
        assert_eq!(q.len(), 0);
        assert_eq!(q.dequeue(), None);
        assert_eq!(q.peek(), None);
    }

    #[test]
    fn test_capacity_keeps_one_slot_free() {
        let q: FrameQueue<4> = FrameQueue::new();
        assert!(q.enqueue(&frame(b'A')));
        assert!(q.enqueue(&frame(b'B')));
        assert!(q.enqueue(&frame(b'C')));
        assert!(q.is_full());
        assert_eq!(q.len(), q.usable_capacity());
        assert!(!q.enqueue(&frame(b'D')));
        assert_eq!(q.len(), 3);

        assert_eq!(q.dequeue(), Some(frame(b'A')));
        assert!(q.enqueue(&frame(b'D')));
        assert_eq!(q.dequeue(), Some(frame(b'B')));
        assert_eq!(q.dequeue(), Some(frame(b'C')));
        assert_eq!(q.dequeue(), Some(frame(b'D')));
        assert!(q.is_empty());
    }

    #[test]
    fn test_fifo_across_wraparound() {
        let q: FrameQueue<3> = FrameQueue::new();
        for round in 0..10u8 {
            assert!(q.enqueue(&frame(round)));
            assert!(q.enqueue(&frame(round.wrapping_add(100))));
            assert_eq!(q.dequeue(), Some(frame(round)));
            assert_eq!(q.dequeue(), Some(frame(round.wrapping_add(100))));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let q: FrameQueue<4> = FrameQueue::new();
        q.enqueue(&frame(7));
        assert_eq!(q.peek(), Some(frame(7)));
        assert_eq!(q.peek(), Some(frame(7)));
        assert_eq!(q.len(), 1);
        assert_eq!(q.dequeue(), Some(frame(7)));
    }

    #[test]
    fn test_init_discards_contents() {
        let q: FrameQueue<4> = FrameQueue::new();
        q.enqueue(&frame(1));
        q.enqueue(&frame(2));
        q.init();
        assert!(q.is_empty());
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn test_dequeued_frame_is_a_copy() {
        let q: FrameQueue<4> = FrameQueue::new();
        let original = Frame::from_payload(&[0x15, 0x03, 0xAA]).unwrap();
        q.enqueue(&original);
        let out = q.dequeue().unwrap();
        assert_eq!(out, original);
        assert!(q.enqueue(&frame(9)));
        assert_eq!(out.payload(), &[0x15, 0x03, 0xAA]);
    }

    #[test]
    fn test_shared_between_threads() {
        static QUEUE: FrameQueue<8> = FrameQueue::new();
        QUEUE.init();
        let producer = std::thread::spawn(|| {
            let mut sent = 0u8;
            while sent < 50 {
                if QUEUE.enqueue(&frame(sent)) {
                    sent += 1;
                }
            }
        });
        let mut expected = 0u8;
        while expected < 50 {
            if let Some(f) = QUEUE.dequeue() {
                assert_eq!(f.opcode(), Some(expected));
                expected += 1;
            }
        }
        producer.join().unwrap();
    }
}
