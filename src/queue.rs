//! The in-memory admission queue handing event ids from intake to workers.
//!
//! `put` is infallible by design: a hard-capped channel would reject the
//! recovery loader's replay of non-terminal rows whenever it exceeds the
//! steady-state capacity. Capacity is only a hint consulted by `full`/`qsize`.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;
use uuid::Uuid;

pub struct AdmissionQueue {
    maxsize: usize,
    inner: Mutex<VecDeque<Uuid>>,
    notify: Notify,
}

impl AdmissionQueue {
    pub fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            inner: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Always succeeds, regardless of current depth.
    pub fn put(&self, id: Uuid) {
        self.inner.lock().expect("queue mutex poisoned").push_back(id);
        self.notify.notify_one();
    }

    /// Suspends until an id is available, then returns it in FIFO order.
    pub async fn get(&self) -> Uuid {
        loop {
            if let Some(id) = self.inner.lock().expect("queue mutex poisoned").pop_front() {
                return id;
            }
            self.notify.notified().await;
        }
    }

    /// Advisory: true iff current depth has reached the configured capacity.
    pub fn full(&self) -> bool {
        self.qsize() >= self.maxsize
    }

    pub fn qsize(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").len()
    }
}
