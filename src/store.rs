//! Durable, idempotent event persistence.
//!
//! Exposed as a trait so worker and handler code depend on behavior rather
//! than on SQLite specifically; `SqliteEventStore` is the only implementation
//! shipped here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{format_timestamp, Event, EventRow, WebhookRequest};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_or_get(&self, request: &WebhookRequest) -> AppResult<(Event, bool)>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;
    async fn get_by_idempotency_key(&self, key: &str) -> AppResult<Option<Event>>;
    async fn mark_processing(&self, id: Uuid) -> AppResult<()>;
    async fn mark_completed(&self, id: Uuid) -> AppResult<()>;
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        max_attempts: u32,
        base_delay_secs: f64,
        max_delay_secs: f64,
    ) -> AppResult<Event>;
    async fn get_pending_ids(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>>;
    async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: EventRow) -> AppResult<Event> {
        row.into_event()
            .map_err(|e| AppError::Storage(sqlx::Error::Decode(e.into())))
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[tracing::instrument(skip(self, request), fields(idempotency_key = %request.idempotency_key))]
    async fn insert_or_get(&self, request: &WebhookRequest) -> AppResult<(Event, bool)> {
        let id = Uuid::new_v4();
        let now = format_timestamp(Utc::now());
        let payload = serde_json::to_string(&request.payload)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let insert = sqlx::query(
            "INSERT INTO events \
             (id, idempotency_key, event_type, payload, status, attempts, last_error, retry_after, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 'pending', 0, NULL, NULL, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&request.idempotency_key)
        .bind(&request.event_type)
        .bind(&payload)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => {
                let event = self
                    .get_by_id(id)
                    .await?
                    .expect("row just inserted must be readable");
                Ok((event, true))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let event = self
                    .get_by_idempotency_key(&request.idempotency_key)
                    .await?
                    .expect("unique violation implies the conflicting row exists");
                Ok((event, false))
            }
            Err(e) => Err(AppError::Storage(e)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as("SELECT * FROM events WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_event).transpose()
    }

    async fn get_by_idempotency_key(&self, key: &str) -> AppResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as("SELECT * FROM events WHERE idempotency_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Self::row_to_event).transpose()
    }

    async fn mark_processing(&self, id: Uuid) -> AppResult<()> {
        let now = format_timestamp(Utc::now());
        sqlx::query("UPDATE events SET status = 'processing', updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_completed(&self, id: Uuid) -> AppResult<()> {
        let now = format_timestamp(Utc::now());
        sqlx::query("UPDATE events SET status = 'completed', updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, error))]
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        max_attempts: u32,
        base_delay_secs: f64,
        max_delay_secs: f64,
    ) -> AppResult<Event> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;
        let attempts = current.attempts + 1;
        let now = Utc::now();
        let now_str = format_timestamp(now);

        if attempts < max_attempts {
            let delay_secs = (base_delay_secs * 2f64.powi(attempts as i32)).min(max_delay_secs);
            let retry_after = now + chrono::Duration::milliseconds((delay_secs * 1000.0) as i64);
            let retry_after_str = format_timestamp(retry_after);
            sqlx::query(
                "UPDATE events SET status = 'pending', attempts = ?, last_error = ?, \
                 retry_after = ?, updated_at = ? WHERE id = ?",
            )
            .bind(attempts as i64)
            .bind(error)
            .bind(&retry_after_str)
            .bind(&now_str)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE events SET status = 'failed', attempts = ?, last_error = ?, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(attempts as i64)
            .bind(error)
            .bind(&now_str)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        }

        self.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn get_pending_ids(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let now_str = format_timestamp(now);
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM events WHERE status IN ('pending', 'processing') \
             AND (retry_after IS NULL OR retry_after <= ?) ORDER BY created_at ASC",
        )
        .bind(&now_str)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id,)| Uuid::parse_str(&id).map_err(|e| AppError::Validation(e.to_string())))
            .collect()
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let before_str = format_timestamp(before);
        let result =
            sqlx::query("DELETE FROM events WHERE status IN ('completed', 'failed') AND created_at < ?")
                .bind(&before_str)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
