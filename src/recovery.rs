//! Startup-time recovery: re-enqueues every non-terminal event so in-flight
//! or not-yet-retried work survives a process restart.

use std::sync::Arc;

use chrono::Utc;

use crate::error::AppResult;
use crate::queue::AdmissionQueue;
use crate::store::EventStore;

/// Loads all pending/processing rows eligible to run now and puts them on
/// the queue in `created_at` order. `put` has no hard cap, so this may
/// transiently push the queue past its configured capacity; that is
/// intentional, durability wins over admission-control precision here.
pub async fn load_pending(queue: &AdmissionQueue, store: &Arc<dyn EventStore>) -> AppResult<usize> {
    let ids = store.get_pending_ids(Utc::now()).await?;
    let count = ids.len();
    for id in ids {
        queue.put(id);
    }
    Ok(count)
}
