use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use hvacpro_shared::{Customer, JobType, JobWithDetails, Technician};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::validation_error;
use crate::scheduling::{OpenSlot, ScheduleOutcome, ScheduleRequest};
use crate::{ApiError, ApiResult, AppError, AppState};

/// Query parameters for date-scoped listings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DateQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub job_type: JobType,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub slots: Vec<OpenSlot>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    pub job_value: Decimal,
}

pub fn schedule_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs).post(schedule_job))
        .route("/availability", get(availability))
        .route("/customers", get(list_customers))
        .route("/technicians", get(list_technicians))
}

pub fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id/complete", post(complete_job))
        .route("/:id/cancel", post(cancel_job))
}

/// Auto-schedule a job at the first free slot
async fn schedule_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<(StatusCode, Json<JobWithDetails>)> {
    request.validate()?;

    match state.scheduler.auto_schedule_job(request).await? {
        ScheduleOutcome::Scheduled(job) => Ok((StatusCode::CREATED, Json(job))),
        ScheduleOutcome::Unschedulable(reason) => Err(AppError::Unschedulable(reason)),
    }
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateQuery>,
) -> ApiResult<Json<Vec<JobWithDetails>>> {
    let date = params.date.unwrap_or_else(|| state.scheduler.today());
    Ok(Json(state.scheduler.jobs_by_date(date).await?))
}

/// Open start times for a job type on one date, across all active technicians
async fn availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityQuery>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let duration_minutes = *state.scheduler.config().durations.get(params.job_type);
    let slots = state
        .scheduler
        .available_slots(params.date, duration_minutes)
        .await?;

    Ok(Json(AvailabilityResponse {
        date: params.date,
        duration_minutes,
        slots,
    }))
}

async fn list_customers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.scheduler.customers().await?))
}

async fn list_technicians(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Technician>>> {
    Ok(Json(state.scheduler.active_technicians().await?))
}

async fn complete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CompleteJobRequest>,
) -> ApiResult<StatusCode> {
    if request.job_value.is_sign_negative() {
        return Err(validation_error("job_value", "job_value cannot be negative"));
    }

    if state.scheduler.complete_job(id, request.job_value).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_scheduled(&state, id).await)
    }
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.scheduler.cancel_job(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_scheduled(&state, id).await)
    }
}

/// A lifecycle transition was refused: either the job is missing or it already
/// reached a terminal status.
async fn not_scheduled(state: &AppState, id: i64) -> AppError {
    match state.scheduler.job(id).await {
        Ok(Some(_)) => ApiError::conflict(format!("Job {} is not in scheduled status", id)),
        Ok(None) => ApiError::not_found("Job"),
        Err(e) => e.into(),
    }
}
