use super::error::BufferError;
use crate::domain::SearchEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Result of a single enqueue.
#[derive(Debug)]
pub struct Enqueued {
    /// Queue length right after the push.
    pub len: usize,
    /// Oldest event evicted to make room, if the queue was full.
    pub dropped: Option<SearchEvent>,
}

/// Ordered, capped queue of pending search events.
///
/// `enqueue` never blocks and never rejects: once `capacity` is reached the
/// oldest event is evicted. `drain` swaps the whole queue out under the lock,
/// so a concurrent enqueue lands either entirely before or entirely after it.
#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<VecDeque<SearchEvent>>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity { capacity });
        }

        Ok(Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        })
    }

    pub fn enqueue(&self, event: SearchEvent) -> Enqueued {
        let mut events = self.events.lock();

        let dropped = if events.len() >= self.capacity {
            events.pop_front()
        } else {
            None
        };
        events.push_back(event);

        Enqueued {
            len: events.len(),
            dropped,
        }
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&self) -> Vec<SearchEvent> {
        let taken = std::mem::take(&mut *self.events.lock());
        Vec::from(taken)
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
