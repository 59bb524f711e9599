//! End-to-end HTTP scenarios driving a full `Application` through
//! `actix_web::test` against a temp-file-backed database.

use actix_web::{test, web, App};
use serde_json::json;
use webhook_receiver::config::Config;
use webhook_receiver::{handlers, Application};

async fn start_app(queue_maxsize: usize, worker_count: usize) -> (Application, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("events.db");
    let config = Config {
        db_path: db_path.to_string_lossy().to_string(),
        worker_count,
        queue_maxsize,
        ..Config::default()
    };
    let app = Application::start(config).await.unwrap();
    (app, dir)
}

#[actix_web::test]
async fn new_submission_is_accepted_and_duplicate_is_detected() {
    let (application, _dir) = start_app(1000, 1).await;
    let state = application.state.clone();
    let test_app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::register_routes),
    )
    .await;

    let body = json!({
        "idempotency_key": "evt-001",
        "event_type": "order.created",
        "payload": {"order_id": "ORD-1234"}
    });

    let req = test::TestRequest::post()
        .uri("/webhooks")
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 202);
    let first: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(first["idempotency_key"], "evt-001");
    assert_eq!(first["status"], "pending");
    assert!(first["created_at"].is_string());
    let id = first["id"].as_str().unwrap().to_string();

    // scenario 2: identical repeat returns 200 with the same id
    let req = test::TestRequest::post()
        .uri("/webhooks")
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 200);
    let second: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(second["id"], id);

    // scenario 3: lookup by id includes updated_at
    let req = test::TestRequest::get()
        .uri(&format!("/webhooks/{id}"))
        .to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 200);
    let fetched: serde_json::Value = test::read_body_json(resp).await;
    assert!(fetched["updated_at"].is_string());

    application.shutdown().await;
}

#[actix_web::test]
async fn lookup_by_missing_idempotency_key_is_404() {
    let (application, _dir) = start_app(1000, 1).await;
    let state = application.state.clone();
    let test_app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::register_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/webhooks?idempotency_key=missing")
        .to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 404);

    application.shutdown().await;
}

#[actix_web::test]
async fn full_queue_rejects_new_submissions_with_429() {
    let (application, _dir) = start_app(1, 0).await;
    let state = application.state.clone();

    // Pre-fill the queue to its capacity of one.
    state.queue.put(uuid::Uuid::new_v4());
    assert!(state.queue.full());

    let test_app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::register_routes),
    )
    .await;

    let body = json!({
        "idempotency_key": "evt-overflow",
        "event_type": "order.created",
        "payload": {}
    });
    let req = test::TestRequest::post()
        .uri("/webhooks")
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 429);

    // The row still exists, pending, for the next recovery cycle.
    let event = state
        .store
        .get_by_idempotency_key("evt-overflow")
        .await
        .unwrap()
        .expect("row persisted despite rejection");
    assert_eq!(event.status, webhook_receiver::models::EventStatus::Pending);

    application.shutdown().await;
}

#[actix_web::test]
async fn health_and_ready_report_ok_once_started() {
    let (application, _dir) = start_app(1000, 1).await;
    let state = application.state.clone();
    let test_app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::register_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/ready").to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&test_app, req).await;
    assert_eq!(resp.status(), 200);

    application.shutdown().await;
}

#[actix_web::test]
async fn restart_recovers_non_terminal_row_onto_the_queue_before_ready() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("events.db");
    let config = Config {
        db_path: db_path.to_string_lossy().to_string(),
        worker_count: 0,
        ..Config::default()
    };

    let first_run = Application::start(config.clone()).await.unwrap();
    let (event, _) = first_run
        .state
        .store
        .insert_or_get(&webhook_receiver::models::WebhookRequest {
            idempotency_key: "evt-restart".to_string(),
            event_type: "order.created".to_string(),
            payload: serde_json::json!({}),
        })
        .await
        .unwrap();
    first_run.shutdown().await;

    // Simulate a restart against the same database file: recovery must
    // place the non-terminal row's id on the queue as part of startup,
    // before the application is handed back (i.e. before readiness).
    let second_run = Application::start(config).await.unwrap();
    assert!(second_run.state.is_ready());
    let recovered_id = second_run.state.queue.get().await;
    assert_eq!(recovered_id, event.id);

    second_run.shutdown().await;
}
