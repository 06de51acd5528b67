use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{StudentComplianceRecord, StudentId};
use super::repository::{ComplianceRepository, ComplianceStatusView, NocNotifier, RepositoryError};
use super::service::{NocReviewService, ReviewAction, ReviewError};

const DEFAULT_QUEUE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub(crate) action: ReviewAction,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueParams {
    pub(crate) limit: Option<usize>,
}

/// Router builder exposing record intake, eligibility checks, and reviewer decisions.
pub fn noc_router<R, N>(service: Arc<NocReviewService<R, N>>) -> Router
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    Router::new()
        .route("/api/v1/noc/students", post(register_handler::<R, N>))
        .route(
            "/api/v1/noc/students/:student_id",
            get(status_handler::<R, N>),
        )
        .route(
            "/api/v1/noc/students/:student_id/eligibility",
            get(eligibility_handler::<R, N>),
        )
        .route(
            "/api/v1/noc/students/:student_id/decision",
            post(decision_handler::<R, N>),
        )
        .route("/api/v1/noc/review-queue", get(queue_handler::<R, N>))
        .route("/api/v1/noc/summary", get(summary_handler::<R, N>))
        .with_state(service)
}

pub(crate) async fn register_handler<R, N>(
    State(service): State<Arc<NocReviewService<R, N>>>,
    axum::Json(record): axum::Json<StudentComplianceRecord>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    match service.register(record) {
        Ok(record) => {
            let verdict = service.evaluator().evaluate(&record);
            let view = ComplianceStatusView::from_record(&record, Some(&verdict));
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(ReviewError::Repository(RepositoryError::Conflict)) => error_response(
            StatusCode::CONFLICT,
            "compliance record already exists".to_string(),
        ),
        Err(other) => review_error_response(other),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<NocReviewService<R, N>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    match service.get(&StudentId(student_id)) {
        Ok(record) => {
            let verdict = service.evaluator().evaluate(&record);
            let view = ComplianceStatusView::from_record(&record, Some(&verdict));
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(other) => review_error_response(other),
    }
}

pub(crate) async fn eligibility_handler<R, N>(
    State(service): State<Arc<NocReviewService<R, N>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    match service.evaluate(&StudentId(student_id)) {
        Ok(verdict) => (StatusCode::OK, axum::Json(verdict)).into_response(),
        Err(other) => review_error_response(other),
    }
}

pub(crate) async fn decision_handler<R, N>(
    State(service): State<Arc<NocReviewService<R, N>>>,
    Path(student_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    match service.decide(&StudentId(student_id), request.action) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(ReviewError::NotEligible(verdict)) => {
            let payload = json!({
                "error": "student is not eligible for NOC approval",
                "verdict": verdict.as_ref(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => review_error_response(other),
    }
}

pub(crate) async fn queue_handler<R, N>(
    State(service): State<Arc<NocReviewService<R, N>>>,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    let limit = params.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.review_queue(limit) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(other) => review_error_response(other),
    }
}

pub(crate) async fn summary_handler<R, N>(
    State(service): State<Arc<NocReviewService<R, N>>>,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    let limit = params.limit.unwrap_or(usize::MAX);
    match service.cohort_summary(limit) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(other) => review_error_response(other),
    }
}

fn review_error_response(error: ReviewError) -> Response {
    let status = match &error {
        ReviewError::Invalid(_) | ReviewError::NotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewError::Repository(RepositoryError::NotFound)
        | ReviewError::UnknownAssignment(_)
        | ReviewError::UnknownSceComponent(_) => StatusCode::NOT_FOUND,
        ReviewError::Repository(RepositoryError::Conflict) | ReviewError::AlreadyDecided(_) => {
            StatusCode::CONFLICT
        }
        ReviewError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error.to_string())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}
