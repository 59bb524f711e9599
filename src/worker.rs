//! The worker pool: drains the admission queue, simulates or delegates
//! processing, and applies the retry/backoff policy on failure.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::Config;
use crate::metrics;
use crate::queue::AdmissionQueue;
use crate::store::EventStore;

/// The pluggable processing body. The default implementation is a
/// placeholder simulated delay; a real deployment substitutes a handler
/// that does the actual side-effecting work for an event.
#[async_trait]
pub trait ProcessingAction: Send + Sync {
    async fn process(&self, event_id: Uuid) -> Result<(), String>;
}

/// Simulates work with a uniformly distributed delay in [2, 5) seconds.
pub struct SimulatedDelayAction;

#[async_trait]
impl ProcessingAction for SimulatedDelayAction {
    async fn process(&self, _event_id: Uuid) -> Result<(), String> {
        let secs = rand::thread_rng().gen_range(2.0..5.0);
        tokio::time::sleep(std::time::Duration::from_secs_f64(secs)).await;
        Ok(())
    }
}

/// Runs a single processing attempt for `event_id` and applies the result
/// to the store: mark-completed on success, mark-failed (with deferred
/// re-enqueue scheduling) on failure.
pub async fn process_event(
    event_id: Uuid,
    store: &Arc<dyn EventStore>,
    queue: &Arc<AdmissionQueue>,
    action: &Arc<dyn ProcessingAction>,
    config: &Config,
) {
    tracing::info!(%event_id, "processing event");
    if let Err(e) = store.mark_processing(event_id).await {
        tracing::error!(%event_id, error = %e, "failed to mark event processing");
        return;
    }

    let start = Instant::now();
    let result = action.process(event_id).await;
    metrics::PROCESSING_DURATION.observe(start.elapsed().as_secs_f64());

    match result {
        Ok(()) => {
            if let Err(e) = store.mark_completed(event_id).await {
                tracing::error!(%event_id, error = %e, "failed to mark event completed");
            } else {
                tracing::info!(%event_id, "completed event");
            }
        }
        Err(reason) => {
            metrics::PROCESSING_ERRORS_TOTAL.inc();
            match store
                .mark_failed(
                    event_id,
                    &reason,
                    config.max_attempts,
                    config.retry_base_delay_secs,
                    config.retry_max_delay_secs,
                )
                .await
            {
                Ok(event) if event.status.is_terminal() => {
                    tracing::error!(%event_id, error = %reason, attempts = event.attempts, "dead-lettered event");
                }
                Ok(event) => {
                    tracing::info!(%event_id, attempts = event.attempts, "retry scheduled");
                    if let Some(retry_after) = event.retry_after {
                        schedule_deferred_reenqueue(event_id, retry_after, queue.clone());
                    }
                }
                Err(e) => {
                    tracing::error!(%event_id, error = %e, "failed to record processing failure");
                }
            }
        }
    }
}

/// Closes the retry-visibility gap: rather than waiting for a future
/// restart's recovery scan to notice a `pending` row whose `retry_after`
/// has elapsed, the worker that just failed the attempt spawns a detached
/// timer that re-enqueues the same id once `retry_after` arrives.
fn schedule_deferred_reenqueue(
    event_id: Uuid,
    retry_after: chrono::DateTime<Utc>,
    queue: Arc<AdmissionQueue>,
) {
    tokio::spawn(async move {
        let delay = (retry_after - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        tokio::time::sleep(delay).await;
        queue.put(event_id);
    });
}

/// One worker's loop: pull an id, observe queue depth, process it, repeat
/// until the shutdown signal fires.
pub async fn worker_loop(
    queue: Arc<AdmissionQueue>,
    store: Arc<dyn EventStore>,
    action: Arc<dyn ProcessingAction>,
    config: Arc<Config>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event_id = tokio::select! {
            id = queue.get() => id,
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };
        metrics::QUEUE_DEPTH.set(queue.qsize() as i64);
        process_event(event_id, &store, &queue, &action, &config).await;
    }
}
