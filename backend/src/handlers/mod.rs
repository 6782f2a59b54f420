use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use hvacpro_shared::DashboardKpis;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{ApiResult, AppState};

pub mod scheduling;

pub use scheduling::{job_routes, schedule_routes};

/// Builds the full router over the shared application state.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "HVAC Pro Scheduling API v1.0.0" }))
        .route("/health", get(health_check))
        .route("/api/v1/dashboard", get(dashboard_stats))
        .nest("/api/v1/schedule", schedule_routes())
        .nest("/api/v1/jobs", job_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({"status": "healthy", "service": "hvacpro-scheduler"})))
}

pub async fn dashboard_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardKpis>> {
    Ok(Json(state.scheduler.dashboard_kpis().await?))
}
