use crate::infra::AppState;
use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use noc_compliance::error::AppError;
use noc_compliance::workflows::noc::{
    noc_router, ComplianceRepository, EligibilityEvaluator, EligibilityVerdict, NocNotifier,
    NocReviewService, RecordGuard, StudentComplianceRecord, StudentId,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct EvaluatedRecord {
    pub(crate) student_id: StudentId,
    pub(crate) name: String,
    pub(crate) roll_no: String,
    pub(crate) attendance_percentage: f64,
    pub(crate) verdict: EligibilityVerdict,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchEvaluationResponse {
    pub(crate) min_attendance_percent: f64,
    pub(crate) eligible: usize,
    pub(crate) ineligible: usize,
    pub(crate) results: Vec<EvaluatedRecord>,
}

pub(crate) fn with_noc_routes<R, N>(service: Arc<NocReviewService<R, N>>) -> axum::Router
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    noc_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/noc/evaluate",
            axum::routing::post(batch_evaluation_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Evaluates a JSON array of records without storing them. The body is decoded by hand so a
/// malformed payload surfaces as `AppError::Decode` rather than axum's rejection text.
pub(crate) async fn batch_evaluation_endpoint(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> Result<Json<BatchEvaluationResponse>, AppError> {
    let records: Vec<StudentComplianceRecord> = serde_json::from_slice(&body)?;
    let results = evaluate_records(&state.evaluator, records)?;
    let eligible = results
        .iter()
        .filter(|result| result.verdict.is_approved())
        .count();

    Ok(Json(BatchEvaluationResponse {
        min_attendance_percent: state.evaluator.min_attendance_percent(),
        eligible,
        ineligible: results.len() - eligible,
        results,
    }))
}

/// Validates every record before evaluating any of them; the first invalid record aborts the batch.
pub(crate) fn evaluate_records(
    evaluator: &EligibilityEvaluator,
    records: Vec<StudentComplianceRecord>,
) -> Result<Vec<EvaluatedRecord>, AppError> {
    let guard = RecordGuard;
    for record in &records {
        guard.validate(record)?;
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let verdict = evaluator.evaluate(&record);
            EvaluatedRecord {
                student_id: record.student_id,
                name: record.name,
                roll_no: record.roll_no,
                attendance_percentage: record.attendance_percentage,
                verdict,
            }
        })
        .collect())
}
