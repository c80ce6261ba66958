use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use care_ai::workflows::assessment::{
    assessment_router, AnswerSet, AssessmentRepository, AssessmentService, CareTeamNotifier,
    DecisionEngine, DecisionResult,
};

pub(crate) fn with_assessment_routes<R, N>(
    service: Arc<AssessmentService<R, N>>,
) -> axum::Router
where
    R: AssessmentRepository + 'static,
    N: CareTeamNotifier + 'static,
{
    assessment_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/care-level",
            axum::routing::post(care_level_endpoint),
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

/// One-shot scoring endpoint: an answer map in, a decision out. Nothing is
/// stored, which makes it the natural integration point for the intake
/// form's live preview.
pub(crate) async fn care_level_endpoint(
    Extension(engine): Extension<Arc<DecisionEngine>>,
    Json(answers): Json<AnswerSet>,
) -> Json<DecisionResult> {
    Json(engine.evaluate(&answers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use care_ai::workflows::assessment::{AnswerValue, CareDecision, CareTier, EngineConfig};
    use std::collections::BTreeMap;

    fn engine() -> Arc<DecisionEngine> {
        Arc::new(DecisionEngine::new(EngineConfig::standard()).expect("standard tables validate"))
    }

    #[tokio::test]
    async fn care_level_endpoint_scores_a_complete_intake() {
        let mut answers: AnswerSet = BTreeMap::new();
        answers.insert(
            "memory_changes".to_string(),
            AnswerValue::scalar("severe diagnosis"),
        );
        answers.insert(
            "primary_support".to_string(),
            AnswerValue::scalar("none regular"),
        );
        answers.insert("badls".to_string(), AnswerValue::list(["bathing"]));
        answers.insert("mobility".to_string(), AnswerValue::scalar("independent"));

        let Json(result) = care_level_endpoint(Extension(engine()), Json(answers)).await;

        assert_eq!(
            result.decision.tier(),
            Some(CareTier::HighAcuityMemoryCare)
        );
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn care_level_endpoint_returns_the_no_data_sentinel() {
        let Json(result) = care_level_endpoint(Extension(engine()), Json(BTreeMap::new())).await;

        assert_eq!(result.decision, CareDecision::NoData);
        assert_eq!(result.confidence, 0.0);
    }
}
