//! Fixed-capacity FIFO ring buffer.
//!
//! All access happens with the pool mutex held, so the queue itself
//! carries no locking. Occupied slots are exactly `[front, front+len)`
//! modulo capacity.

pub(crate) struct BoundedQueue<T> {
    slots: Vec<Option<T>>,
    front: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        BoundedQueue {
            slots,
            front: 0,
            len: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Enqueue at the tail. Returns the value back if the queue is full.
    pub(crate) fn push(&mut self, value: T) -> std::result::Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        let tail = (self.front + self.len) % self.slots.len();
        debug_assert!(self.slots[tail].is_none());
        self.slots[tail] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Dequeue from the front, strict FIFO.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // the occupied-slot invariant makes this take infallible
        let value = self.slots[self.front].take();
        debug_assert!(value.is_some());
        self.front = (self.front + 1) % self.slots.len();
        self.len -= 1;
        value
    }

    /// Drop everything still queued, returning how many were discarded.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.len;
        while self.pop().is_some() {}
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::BoundedQueue;

    #[test]
    fn fifo_order() {
        let mut q = BoundedQueue::with_capacity(3);
        q.push(1).unwrap();
        q.push(2).unwrap();
        q.push(3).unwrap();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn rejects_push_when_full() {
        let mut q = BoundedQueue::with_capacity(2);
        q.push("a").unwrap();
        q.push("b").unwrap();
        assert!(q.is_full());
        assert_eq!(q.push("c"), Err("c"));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn wraps_around() {
        let mut q = BoundedQueue::with_capacity(2);
        for i in 0..10 {
            q.push(i).unwrap();
            q.push(i + 100).unwrap();
            assert_eq!(q.pop(), Some(i));
            assert_eq!(q.pop(), Some(i + 100));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut q = BoundedQueue::with_capacity(4);
        for i in 0..4 {
            q.push(i).unwrap();
            assert!(q.len() <= q.capacity());
        }
        let _ = q.push(99);
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn clear_reports_dropped_count() {
        let mut q = BoundedQueue::with_capacity(5);
        q.push(1).unwrap();
        q.push(2).unwrap();
        q.pop();
        q.push(3).unwrap();
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }
}
