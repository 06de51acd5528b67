use super::common::*;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::noc::router::{
    decision_handler, eligibility_handler, queue_handler, register_handler, DecisionRequest,
    QueueParams,
};
use crate::workflows::noc::{NocReviewService, ReviewAction};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serializes"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn register_route_accepts_records() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let body = serde_json::to_value(eligible_record("route")).expect("serializes");

    let response = router
        .oneshot(json_request("POST", "/api/v1/noc/students", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["student_id"], "stu-route");
    assert_eq!(payload["noc_status"], "pending");
    assert_eq!(payload["attendance_standing"], "good");
    assert_eq!(payload["eligibility"], "eligible for NOC");
}

#[tokio::test]
async fn register_handler_rejects_invalid_records() {
    let (service, _, _) = build_service();

    let response = register_handler(
        State(Arc::new(service)),
        axum::Json(record("bad", -3.0, Vec::new(), Vec::new())),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_handler_returns_conflict_on_duplicate() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.register(eligible_record("dup")).expect("first insert");

    let response = register_handler(State(service), axum::Json(eligible_record("dup"))).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(NocReviewService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
        evaluator(),
    ));

    let response = register_handler(State(service), axum::Json(eligible_record("down"))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_student() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/noc/students/stu-missing")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn eligibility_handler_returns_breakdown() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service
        .register(low_attendance_record("elig"))
        .expect("registers");

    let response = eligibility_handler(State(service), Path("stu-elig".to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["attendance"], "fail");
    assert_eq!(payload["assignments"], "pass");
    assert_eq!(payload["sce"], "pass");
    assert_eq!(payload["overall"], "rejected");
}

#[tokio::test]
async fn decision_route_approves_eligible_student() {
    let (service, _, notifier) = build_service();
    service.register(eligible_record("ok")).expect("registers");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/noc/students/stu-ok/decision",
            json!({ "action": "approve" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["noc_status"], "approved");
    assert_eq!(notifier.events().len(), 1);
}

#[tokio::test]
async fn decision_handler_reports_ineligible_approval() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service
        .register(low_attendance_record("no"))
        .expect("registers");

    let response = decision_handler(
        State(service),
        Path("stu-no".to_string()),
        axum::Json(DecisionRequest {
            action: ReviewAction::Approve,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["verdict"]["attendance"], "fail");
}

#[tokio::test]
async fn decision_handler_returns_conflict_once_decided() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.register(eligible_record("twice")).expect("registers");
    service
        .decide(&crate::workflows::noc::StudentId("stu-twice".to_string()), ReviewAction::Reject)
        .expect("rejection succeeds");

    let response = decision_handler(
        State(service),
        Path("stu-twice".to_string()),
        axum::Json(DecisionRequest {
            action: ReviewAction::Approve,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn queue_handler_honours_limit() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    for suffix in ["q1", "q2", "q3"] {
        service.register(eligible_record(suffix)).expect("registers");
    }

    let response = queue_handler(
        State(service),
        Query(QueueParams { limit: Some(2) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn summary_route_reports_cohort_counts() {
    let (service, _, _) = build_service();
    service.register(eligible_record("s1")).expect("registers");
    service
        .register(low_attendance_record("s2"))
        .expect("registers");
    let router = router_with_service(service);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/noc/summary")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], 2);
    assert_eq!(payload["eligible"], 1);
    assert_eq!(payload["pending"], 2);
}
