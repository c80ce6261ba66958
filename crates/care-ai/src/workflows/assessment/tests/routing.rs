use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("request")
}

#[tokio::test]
async fn post_assessment_returns_tracking_id() {
    let router = build_router();
    let payload = serde_json::to_value(submission(minimal_critical())).expect("serialize");

    let response = router
        .oneshot(json_request("POST", "/api/v1/assessments", payload))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert!(payload.get("assessment_id").is_some());
    assert_eq!(
        payload.get("status").and_then(Value::as_str),
        Some("submitted")
    );
}

#[tokio::test]
async fn preview_evaluates_without_persisting() {
    let (service, repository, _) = build_service();
    let router = crate::workflows::assessment::assessment_router(std::sync::Arc::new(service));

    let payload = serde_json::to_value(high_acuity_answers()).expect("serialize");
    let response = router
        .oneshot(json_request("POST", "/api/v1/assessments/preview", payload))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload
            .get("decision")
            .and_then(|decision| decision.get("tier"))
            .and_then(Value::as_str),
        Some("high_acuity_memory_care")
    );
    assert_eq!(repository.len(), 0);
}

#[tokio::test]
async fn evaluate_endpoint_returns_the_decision_result() {
    let (service, _, _) = build_service();
    let record = service
        .submit(submission(high_acuity_answers()))
        .expect("submission succeeds");
    let router = crate::workflows::assessment::assessment_router(std::sync::Arc::new(service));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/assessments/{}/evaluation", record.id.0),
            json!(null),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.get("confidence").is_some());
    assert!(payload
        .get("flags")
        .and_then(Value::as_array)
        .map(|flags| flags.iter().any(|flag| flag == "cog_severe"))
        .unwrap_or(false));

    let status = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/assessments/{}", record.id.0))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    assert_eq!(status.status(), StatusCode::OK);
    let payload = read_json_body(status).await;
    assert_eq!(
        payload.get("status").and_then(Value::as_str),
        Some("evaluated")
    );
    assert_eq!(
        payload.get("tier").and_then(Value::as_str),
        Some("high_acuity_memory_care")
    );
}

#[tokio::test]
async fn evaluating_an_unknown_assessment_is_a_404() {
    let router = build_router();

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/assessments/asmt-missing/evaluation",
            json!(null),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_assessment_status_returns_pending_view() {
    let router = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/assessments/asmt-unknown")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("status").and_then(Value::as_str),
        Some("submitted")
    );
    assert!(payload
        .get("decision_rationale")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("pending"));
}
