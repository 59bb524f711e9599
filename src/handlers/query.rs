use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::lifecycle::AppState;
use crate::metrics;
use crate::models::EventStatusResponse;

/// GET /webhooks/{id}
pub async fn get_by_id(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let event = state
        .store
        .get_by_id(path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(EventStatusResponse::from(&event)))
}

#[derive(Debug, Deserialize)]
pub struct IdempotencyKeyQuery {
    pub idempotency_key: String,
}

/// GET /webhooks?idempotency_key=...
pub async fn get_by_idempotency_key(
    state: web::Data<AppState>,
    query: web::Query<IdempotencyKeyQuery>,
) -> AppResult<HttpResponse> {
    let event = state
        .store
        .get_by_idempotency_key(&query.idempotency_key)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(EventStatusResponse::from(&event)))
}

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// GET /ready
pub async fn ready(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    if state.is_ready() {
        Ok(HttpResponse::Ok().json(serde_json::json!({"status": "ok"})))
    } else {
        Err(AppError::NotReady)
    }
}

/// GET /metrics
pub async fn metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::encode())
}
