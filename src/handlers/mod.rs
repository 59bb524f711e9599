//! HTTP handlers: intake, query, health/ready/metrics.

mod intake;
mod query;

pub use intake::post_webhook;
pub use query::{get_by_id, get_by_idempotency_key, health, metrics, ready};

use actix_web::web;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/webhooks")
            .route(web::post().to(post_webhook))
            .route(web::get().to(get_by_idempotency_key)),
    )
    .route("/webhooks/{id}", web::get().to(get_by_id))
    .route("/health", web::get().to(health))
    .route("/ready", web::get().to(ready))
    .route("/metrics", web::get().to(metrics));
}
