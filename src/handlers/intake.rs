use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::lifecycle::AppState;
use crate::metrics;
use crate::models::{WebhookRequest, WebhookResponse};

/// POST /webhooks
///
/// Inserts or looks up the event by idempotency key, admits it to the
/// queue when there is room, and reports the outcome.
pub async fn post_webhook(
    state: web::Data<AppState>,
    body: web::Json<WebhookRequest>,
) -> AppResult<HttpResponse> {
    let (event, is_new) = state.store.insert_or_get(&body).await?;

    if is_new {
        if state.queue.full() {
            tracing::warn!(event_id = %event.id, "queue full, rejecting event");
            metrics::EVENTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(crate::error::AppError::QueueFull);
        }
        state.queue.put(event.id);
        metrics::EVENTS_TOTAL.with_label_values(&["accepted"]).inc();
        metrics::QUEUE_DEPTH.set(state.queue.qsize() as i64);
        tracing::info!(event_id = %event.id, event_type = %body.event_type, "accepted event");
    } else {
        metrics::EVENTS_TOTAL.with_label_values(&["duplicate"]).inc();
        tracing::info!(idempotency_key = %body.idempotency_key, "duplicate event");
    }

    let response = WebhookResponse::from(&event);
    Ok(if is_new {
        HttpResponse::Accepted().json(response)
    } else {
        HttpResponse::Ok().json(response)
    })
}
