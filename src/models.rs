//! The `Event` domain type and its wire/row representations.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EventStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Failed)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Pending => "pending",
            EventStatus::Processing => "processing",
            EventStatus::Completed => "completed",
            EventStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "processing" => Ok(EventStatus::Processing),
            "completed" => Ok(EventStatus::Completed),
            "failed" => Ok(EventStatus::Failed),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

/// A persisted webhook event and its processing state.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub idempotency_key: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: EventStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub retry_after: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw column shape as stored: timestamps and status are TEXT, id is TEXT.
#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub id: String,
    pub idempotency_key: String,
    pub event_type: String,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub retry_after: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl EventRow {
    pub fn into_event(self) -> Result<Event, String> {
        Ok(Event {
            id: Uuid::parse_str(&self.id).map_err(|e| e.to_string())?,
            idempotency_key: self.idempotency_key,
            event_type: self.event_type,
            payload: serde_json::from_str(&self.payload).map_err(|e| e.to_string())?,
            status: self.status.parse()?,
            attempts: self.attempts as u32,
            last_error: self.last_error,
            retry_after: self
                .retry_after
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Renders a timestamp the same way it is persisted: RFC 3339 with
/// microsecond precision, so chronological and lexicographic order agree.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

/// Body accepted by `POST /webhooks`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    pub idempotency_key: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Body returned by the intake handler.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub id: Uuid,
    pub idempotency_key: String,
    pub status: EventStatus,
    pub created_at: String,
}

impl From<&Event> for WebhookResponse {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id,
            idempotency_key: e.idempotency_key.clone(),
            status: e.status,
            created_at: format_timestamp(e.created_at),
        }
    }
}

/// Body returned by the query handlers.
#[derive(Debug, Clone, Serialize)]
pub struct EventStatusResponse {
    pub id: Uuid,
    pub idempotency_key: String,
    pub status: EventStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Event> for EventStatusResponse {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id,
            idempotency_key: e.idempotency_key.clone(),
            status: e.status,
            created_at: format_timestamp(e.created_at),
            updated_at: format_timestamp(e.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            EventStatus::Pending,
            EventStatus::Processing,
            EventStatus::Completed,
            EventStatus::Failed,
        ] {
            let parsed: EventStatus = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn timestamp_round_trips() {
        let now = Utc::now();
        let formatted = format_timestamp(now);
        let parsed = parse_timestamp(&formatted).unwrap();
        assert_eq!(now.timestamp_micros(), parsed.timestamp_micros());
    }
}
