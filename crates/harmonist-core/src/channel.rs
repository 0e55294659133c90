//! Lock-free single-producer/single-consumer pitch channel
//!
//! The producer half may live inside a real-time audio callback: `write` never
//! blocks, never allocates and never takes a lock. When the ring is full the
//! newest item is dropped and the producer sees `false`.
//!
//! One slot always stays empty so that `head == tail` means "empty" and
//! `tail + 1 == head` means "full". A channel built with capacity `n` therefore
//! holds at most `n - 1` items.

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pitch::DetectedPitch;

/// Default number of slots, sized for ~100 ms of detector output
pub const DEFAULT_CAPACITY: usize = 128;

struct Ring<T> {
    slots: Box<[UnsafeCell<Option<T>>]>,
    /// Next slot to read; written only by the consumer
    head: AtomicUsize,
    /// Next slot to write; written only by the producer
    tail: AtomicUsize,
}

// Each slot is touched by exactly one side at a time: the producer owns
// slots in [tail, head) and the consumer owns [head, tail). Ownership moves
// through the release store on the index.
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn next(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail + self.capacity() - head) % self.capacity()
    }
}

/// Producer half. Not `Clone`: there is only ever one writer.
pub struct PitchSender<T = DetectedPitch> {
    ring: Arc<Ring<T>>,
}

/// Consumer half. Not `Clone`: there is only ever one reader.
pub struct PitchReceiver<T = DetectedPitch> {
    ring: Arc<Ring<T>>,
}

/// Create a bounded SPSC channel with `capacity` slots (minimum 2)
pub fn pitch_channel<T: Send>(capacity: usize) -> (PitchSender<T>, PitchReceiver<T>) {
    let capacity = capacity.max(2);
    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(None))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let ring = Arc::new(Ring {
        slots,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });

    (PitchSender { ring: ring.clone() }, PitchReceiver { ring })
}

impl<T: Send> PitchSender<T> {
    /// Enqueue an item. Returns `false` and drops the item when full.
    pub fn write(&mut self, item: T) -> bool {
        let ring = &*self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);
        let next = ring.next(tail);

        if next == ring.head.load(Ordering::Acquire) {
            return false;
        }

        // SAFETY: the slot at `tail` is outside [head, tail), so the consumer
        // will not look at it until the release store below publishes it.
        unsafe {
            *ring.slots[tail].get() = Some(item);
        }
        ring.tail.store(next, Ordering::Release);
        true
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Items currently queued (a snapshot; the consumer may be draining)
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send> PitchReceiver<T> {
    /// Dequeue the oldest item, `None` when empty
    pub fn read(&mut self) -> Option<T> {
        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);

        if head == ring.tail.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `head != tail`, so the producer has published this slot and
        // will not touch it again until we advance `head`.
        let item = unsafe { (*ring.slots[head].get()).take() };
        ring.head.store(ring.next(head), Ordering::Release);
        item
    }

    /// Move everything currently queued into `out`, oldest first.
    /// Returns the number of items moved.
    pub fn drain_into(&mut self, out: &mut Vec<T>) -> usize {
        let mut moved = 0;
        while let Some(item) = self.read() {
            out.push(item);
            moved += 1;
        }
        moved
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
