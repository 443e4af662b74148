use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use super::errors;
use crate::service::{CreateScheduleRequest, ScheduleService};

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    pub date: Option<NaiveDate>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route("/sweep", post(run_sweep))
        .route("/:id/status", get(schedule_status))
        .route("/:id/result", get(schedule_result))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// POST /schedules
///
/// Accepts `{staffGroupId, weekBeginDate}` and answers 202 with the job's
/// `{scheduleId, status, errorMessage}` before generation has run.
pub async fn create_schedule(
    Extension(service): Extension<Arc<ScheduleService>>,
    body: Result<Json<CreateScheduleRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    match service.submit(body).await {
        Ok(response) => (StatusCode::ACCEPTED, Json(response)).into_response(),
        Err(e) => errors::scheduler_error_to_response(e),
    }
}

/// GET /schedules?page=0&size=10
pub async fn list_schedules(
    Extension(service): Extension<Arc<ScheduleService>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);
    if size == 0 || size > MAX_PAGE_SIZE {
        return bad_request(format!("size must be between 1 and {MAX_PAGE_SIZE}"));
    }
    match service.list(page, size).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::scheduler_error_to_response(e),
    }
}

pub async fn schedule_status(
    Extension(service): Extension<Arc<ScheduleService>>,
    Path(id): Path<String>,
) -> Response {
    match service.status(&id).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::scheduler_error_to_response(e),
    }
}

pub async fn schedule_result(
    Extension(service): Extension<Arc<ScheduleService>>,
    Path(id): Path<String>,
) -> Response {
    match service.result(&id).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::scheduler_error_to_response(e),
    }
}

/// POST /schedules/sweep?date=2026-10-20
///
/// Runs one promotion sweep over the live store, as the daily loop would on
/// `date` (default: today).
pub async fn run_sweep(
    Extension(service): Extension<Arc<ScheduleService>>,
    query: Result<Query<SweepQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let today = query.date.unwrap_or_else(|| Local::now().date_naive());
    match service.run_sweep(today).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::scheduler_error_to_response(e),
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    errors::json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}
