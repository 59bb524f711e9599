//! Periodic deletion of expired terminal rows.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::config::Config;
use crate::store::EventStore;

/// Runs until the shutdown signal fires. Each tick deletes terminal rows
/// older than the retention horizon, then sleeps for the configured
/// interval; the sleep is the cancellation point.
pub async fn run(store: Arc<dyn EventStore>, config: Arc<Config>, mut shutdown: watch::Receiver<bool>) {
    let interval = std::time::Duration::from_secs(config.cleanup_interval_hours * 3600);
    loop {
        let cutoff = Utc::now() - chrono::Duration::days(config.retention_days);
        match store.delete_expired(cutoff).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "cleanup deleted expired events"),
            Err(e) => tracing::error!(error = %e, "cleanup sweep failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WebhookRequest;
    use crate::store::SqliteEventStore;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn single_sweep_removes_only_expired_terminal_rows() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(include_str!("../migrations/0001_events.sql"))
            .execute(&pool)
            .await
            .unwrap();
        let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::new(pool));

        let (event, _) = store
            .insert_or_get(&WebhookRequest {
                idempotency_key: "evt-sweep-1".to_string(),
                event_type: "order.created".to_string(),
                payload: serde_json::json!({}),
            })
            .await
            .unwrap();
        store.mark_processing(event.id).await.unwrap();
        store.mark_completed(event.id).await.unwrap();

        let cutoff = Utc::now() + chrono::Duration::days(31);
        let deleted = store.delete_expired(cutoff).await.unwrap();
        assert_eq!(deleted, 1);
    }
}
