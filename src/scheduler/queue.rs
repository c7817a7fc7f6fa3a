use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<String>,
    closed: bool,
    /// Consumers currently parked in `pop`.
    idle: usize,
}

/// Bounded FIFO of pending job IDs.
///
/// Producers never wait: [`try_push`](Self::try_push) either takes the id or
/// reports that the queue is full. Consumers park in [`pop`](Self::pop) until
/// an id arrives or the queue is closed and drained.
///
/// A parked consumer counts as one extra slot on top of `capacity`, so an id
/// pushed while a worker is idle is handed straight to it. With a capacity of
/// zero the queue therefore only accepts work when some consumer is waiting.
#[derive(Debug)]
pub struct DispatchQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl DispatchQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            // The buffer grows on demand; `capacity` is only a bound.
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            capacity,
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // The lock is only held for VecDeque operations, which cannot leave
        // the state half-updated, so a poisoned guard is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue an id without blocking. Returns false if the queue is at
    /// capacity or has been closed.
    pub fn try_push(&self, id: String) -> bool {
        {
            let mut state = self.state();
            if state.closed || state.items.len() >= self.capacity.saturating_add(state.idle) {
                return false;
            }
            state.items.push_back(id);
        }
        self.notify.notify_one();
        true
    }

    /// Dequeue the oldest id, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and every buffered id has been
    /// handed out.
    pub async fn pop(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before inspecting the state so a push or close that
            // lands in between still wakes us.
            notified.as_mut().enable();

            let _idle = {
                let mut state = self.state();
                if let Some(id) = state.items.pop_front() {
                    return Some(id);
                }
                if state.closed {
                    return None;
                }
                state.idle += 1;
                IdleGuard { queue: self }
            };

            notified.await;
        }
    }

    /// Stop accepting new ids and wake every parked consumer. Ids already
    /// buffered can still be popped.
    pub fn close(&self) {
        self.state().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Keeps the idle-consumer count accurate even if a `pop` future is dropped
/// while parked.
struct IdleGuard<'a> {
    queue: &'a DispatchQueue,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.queue.state().idle -= 1;
    }
}
