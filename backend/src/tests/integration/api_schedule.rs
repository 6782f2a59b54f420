use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::handlers;
use crate::store::MemoryStore;
use crate::tests::fixtures::*;
use crate::AppState;

// Helper function to create the app over the sample data on a fixed Monday
async fn create_test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_sample_data().await);
    let scheduler = service_on(store.clone(), monday());
    let app = handlers::app(Arc::new(AppState {
        scheduler: Arc::new(scheduler),
    }));
    (app, store)
}

async fn customer_named(store: &MemoryStore, name: &str) -> i64 {
    use crate::store::SchedulingStore;
    store
        .customers()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
        .id
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_schedule_job_endpoint() {
    let (app, store) = create_test_app().await;
    let john = customer_named(&store, "John Smith").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedule/jobs",
        Some(json!({"customer_id": john, "job_type": "maintenance", "notes": "Annual tune-up"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["scheduled_date"], "2024-03-04");
    assert_eq!(body["scheduled_time"], "08:00:00");
    assert_eq!(body["estimated_duration"], 90);
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["priority"], 3);
    assert_eq!(body["customer_name"], "John Smith");
    assert_eq!(body["technician_name"], "Bob Martinez");
    assert_eq!(store.job_count().await, 1);
}

#[tokio::test]
async fn test_schedule_job_rejects_bad_priority() {
    let (app, store) = create_test_app().await;
    let john = customer_named(&store, "John Smith").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedule/jobs",
        Some(json!({"customer_id": john, "job_type": "repair", "priority": 9})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["priority"].is_array());
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn test_schedule_job_on_saturday_has_no_slot() {
    let (app, store) = create_test_app().await;
    let sarah = customer_named(&store, "Sarah Johnson").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedule/jobs",
        Some(json!({"customer_id": sarah, "job_type": "repair", "preferred_date": "2024-03-09"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_AVAILABLE_SLOT");
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn test_schedule_job_for_unknown_customer() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedule/jobs",
        Some(json!({"customer_id": 4242, "job_type": "repair"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn test_list_jobs_by_date() {
    let (app, store) = create_test_app().await;
    let sarah = customer_named(&store, "Sarah Johnson").await;

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/schedule/jobs",
            Some(json!({"customer_id": sarah, "job_type": "electrical"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/v1/schedule/jobs?date=2024-03-04", None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    // Sarah prefers afternoons and only Lisa does electrical work
    assert_eq!(jobs[0]["scheduled_time"], "13:00:00");
    assert_eq!(jobs[1]["scheduled_time"], "15:30:00");
    assert!(jobs.iter().all(|j| j["technician_name"] == "Lisa Chen"));

    // Defaults to the clock's today
    let (_, today) = send(&app, "GET", "/api/v1/schedule/jobs", None).await;
    assert_eq!(today.as_array().unwrap().len(), 2);

    let (_, empty) = send(&app, "GET", "/api/v1/schedule/jobs?date=2024-03-05", None).await;
    assert!(empty.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_availability_endpoint() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/schedule/availability?date=2024-03-04&job_type=installation",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration_minutes"], 180);
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots[0]["time"], "08:00:00");
    assert_eq!(slots.last().unwrap()["time"], "15:00:00");
}

#[tokio::test]
async fn test_customer_and_technician_lists() {
    let (app, _) = create_test_app().await;

    let (status, customers) = send(&app, "GET", "/api/v1/schedule/customers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers[0]["name"], "John Smith");
    assert_eq!(customers[1]["name"], "Sarah Johnson");

    let (status, technicians) = send(&app, "GET", "/api/v1/schedule/technicians", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(technicians[0]["name"], "Bob Martinez");
    assert_eq!(technicians[1]["name"], "Lisa Chen");
}

#[tokio::test]
async fn test_complete_and_cancel_lifecycle() {
    let (app, store) = create_test_app().await;
    let john = customer_named(&store, "John Smith").await;

    let (_, first) = send(
        &app,
        "POST",
        "/api/v1/schedule/jobs",
        Some(json!({"customer_id": john, "job_type": "repair"})),
    )
    .await;
    let (_, second) = send(
        &app,
        "POST",
        "/api/v1/schedule/jobs",
        Some(json!({"customer_id": john, "job_type": "repair"})),
    )
    .await;
    let first_id = first["id"].as_i64().unwrap();
    let second_id = second["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/jobs/{}/complete", first_id),
        Some(json!({"job_value": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/jobs/{}/complete", first_id),
        Some(json!({"job_value": 325.5})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "POST", &format!("/api/v1/jobs/{}/cancel", first_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(&app, "POST", &format!("/api/v1/jobs/{}/cancel", second_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "POST", "/api/v1/jobs/99999/cancel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, kpis) = send(&app, "GET", "/api/v1/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpis["jobs_today"], 2);
    assert_eq!(kpis["open_invoices"], 1);
}
