//! HTTP surface: a thin axum router over [`ScheduleService`].
//!
//! - `routes.rs`: handlers for `/schedules` and `/health`
//! - `errors.rs`: JSON error bodies and status mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use crate::service::ScheduleService;

pub mod errors;
pub mod routes;

pub fn build_router(service: Arc<ScheduleService>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .nest("/schedules", routes::router())
        .layer(Extension(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{Datelike, Local};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::job::{Job, JobStatus};
    use crate::lock::InMemoryLockManager;
    use crate::membership::StaffDirectory;
    use crate::pool::WorkerPool;
    use crate::schedule::{Assignment, AssignmentGenerator, RuleConfig, ShiftKind};
    use crate::store::{InMemoryJobRepository, JobRepository};
    use crate::worker::GenerationWorker;

    struct NoStaff;

    #[async_trait]
    impl StaffDirectory for NoStaff {
        async fn staff_for_group(&self, _group_id: &str) -> BTreeSet<String> {
            BTreeSet::new()
        }
    }

    fn app() -> (Arc<InMemoryJobRepository>, Router) {
        let jobs = Arc::new(InMemoryJobRepository::new());
        let worker = GenerationWorker::new(
            jobs.clone(),
            Arc::new(InMemoryLockManager::new()),
            Arc::new(NoStaff),
            AssignmentGenerator::new(RuleConfig::default()),
            "lock:job",
            Duration::from_secs(60),
        );
        let pool = Arc::new(WorkerPool::start(worker, 1, 4));
        let service = Arc::new(ScheduleService::new(jobs.clone(), pool));
        (jobs, build_router(service))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn next_monday() -> chrono::NaiveDate {
        let today = Local::now().date_naive();
        let ahead = 7 - today.weekday().num_days_from_monday() as i64;
        today + chrono::Duration::days(ahead)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_, app) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn submit_returns_accepted() {
        let (jobs, app) = app();
        let body = format!(
            r#"{{"staffGroupId":"team-a","weekBeginDate":"{}"}}"#,
            next_monday()
        );
        let response = app
            .oneshot(
                Request::post("/schedules")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let json = body_json(response).await;
        let id = json["scheduleId"].as_str().unwrap();
        assert!(jobs.find(id).await.unwrap().is_some());
        assert!(json.get("status").is_some());
        assert!(json.get("errorMessage").is_some());
    }

    #[tokio::test]
    async fn invalid_submission_is_bad_request() {
        let (_, app) = app();
        let response = app
            .oneshot(
                Request::post("/schedules")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"staffGroupId":"","weekBeginDate":"2026-10-26"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_bad_request() {
        let (jobs, app) = app();
        let response = app
            .oneshot(
                Request::post("/schedules")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"staffGroupId":"g","weekBeginDate":"2026-13-45"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert!(!json["message"].as_str().unwrap().is_empty());
        assert!(jobs.list(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_page_size_is_a_json_bad_request() {
        let (_, app) = app();
        let response = app
            .oneshot(Request::get("/schedules?size=abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn sweep_endpoint_promotes_stored_jobs() {
        let (jobs, app) = app();
        let monday = next_monday();
        let mut job = Job::new("team-c", monday);
        job.attach_assignments(vec![Assignment::new("s", monday, ShiftKind::Morning)])
            .unwrap();
        jobs.insert(job.clone()).await.unwrap();

        let uri = format!("/schedules/sweep?date={}", monday.succ_opt().unwrap());
        let response = app
            .clone()
            .oneshot(Request::post(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["toProcessing"], 1);
        assert_eq!(json["toCompleted"], 0);
        let stored = jobs.find(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);

        let response = app
            .oneshot(
                Request::post("/schedules/sweep?date=tomorrow")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_schedule_is_not_found() {
        let (_, app) = app();
        for uri in ["/schedules/nope/status", "/schedules/nope/result"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let json = body_json(response).await;
            assert_eq!(json["message"], "Schedule job not found with ID: nope");
        }
    }

    #[tokio::test]
    async fn status_and_result_for_stored_job() {
        let (jobs, app) = app();
        let job = Job::new("team-b", next_monday());
        jobs.insert(job.clone()).await.unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/schedules/{}/status", job.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["scheduleId"], job.id.as_str());
        assert_eq!(json["status"], "PENDING");
        assert!(json["errorMessage"].is_null());

        let response = app
            .oneshot(
                Request::get(format!("/schedules/{}/result", job.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["staffGroupId"], "team-b");
        assert_eq!(json["weekBeginDate"], next_monday().to_string());
        assert_eq!(json["assignments"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn list_is_paged() {
        let (jobs, app) = app();
        for i in 0..3 {
            jobs.insert(Job::new(format!("g{i}"), next_monday()))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(
                Request::get("/schedules?page=1&size=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["staffGroupId"], "g2");

        let response = app
            .oneshot(Request::get("/schedules?size=0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
