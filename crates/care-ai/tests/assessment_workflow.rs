//! Integration specifications for the assessment intake and evaluation
//! workflow.
//!
//! Scenarios drive the public service facade and HTTP router end-to-end so
//! canonicalization, scoring, rule resolution, and routing are validated
//! without reaching into private modules.

mod common {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use care_ai::workflows::assessment::domain::{
        AnswerSet, AnswerValue, AssessmentId, AssessmentSubmission,
    };
    use care_ai::workflows::assessment::repository::{
        AlertError, AssessmentRecord, AssessmentRepository, CareTeamAlert, CareTeamNotifier,
        RepositoryError,
    };
    use care_ai::workflows::assessment::{AssessmentService, DecisionEngine, EngineConfig};

    pub(super) fn engine() -> DecisionEngine {
        DecisionEngine::new(EngineConfig::standard()).expect("standard tables validate")
    }

    pub(super) fn intake_answers() -> AnswerSet {
        let mut answers: AnswerSet = BTreeMap::new();
        answers.insert(
            "memory_changes".to_string(),
            AnswerValue::scalar("Severe diagnosis"),
        );
        answers.insert(
            "primary_support".to_string(),
            AnswerValue::scalar("none regular"),
        );
        answers.insert("badls".to_string(), AnswerValue::list(["bathing"]));
        answers.insert("mobility".to_string(), AnswerValue::scalar("independent"));
        answers
    }

    pub(super) fn submission(answers: AnswerSet) -> AssessmentSubmission {
        AssessmentSubmission {
            answers,
            completed_on: NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date"),
            referral_source: Some("community referral".to_string()),
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        records: Arc<Mutex<HashMap<AssessmentId, AssessmentRecord>>>,
    }

    impl AssessmentRepository for MemoryRepository {
        fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("lock");
            if guard.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("lock");
            guard.insert(record.id.clone(), record);
            Ok(())
        }

        fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard.get(id).cloned())
        }

        fn pending(&self, _limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryNotifier {
        events: Arc<Mutex<Vec<CareTeamAlert>>>,
    }

    impl MemoryNotifier {
        pub(super) fn events(&self) -> Vec<CareTeamAlert> {
            self.events.lock().expect("lock").clone()
        }
    }

    impl CareTeamNotifier for MemoryNotifier {
        fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError> {
            self.events.lock().expect("lock").push(alert);
            Ok(())
        }
    }

    pub(super) fn build_service() -> (
        AssessmentService<MemoryRepository, MemoryNotifier>,
        Arc<MemoryRepository>,
        Arc<MemoryNotifier>,
    ) {
        let repository = Arc::new(MemoryRepository::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let service = AssessmentService::new(repository.clone(), notifier.clone(), engine());
        (service, repository, notifier)
    }
}

mod evaluation {
    use super::common::*;
    use care_ai::workflows::assessment::repository::AssessmentRepository;
    use care_ai::workflows::assessment::domain::CareTier;
    use care_ai::workflows::assessment::{AssessmentStatus, CareDecision};

    #[test]
    fn high_acuity_intake_escalates_and_alerts() {
        let (service, repository, notifier) = build_service();
        let record = service
            .submit(submission(intake_answers()))
            .expect("submission succeeds");

        let result = service.evaluate(&record.id).expect("evaluation succeeds");

        assert_eq!(
            result.decision.tier(),
            Some(CareTier::HighAcuityMemoryCare)
        );
        assert!(result.flags.iter().any(|flag| flag == "cog_severe"));
        assert!(result.flags.iter().any(|flag| flag == "no_support"));

        let stored = repository
            .fetch(&record.id)
            .expect("repo fetch")
            .expect("record present");
        assert_eq!(stored.status, AssessmentStatus::Evaluated);

        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].template, "high_acuity_placement");
    }

    #[test]
    fn empty_intake_is_a_no_data_sentinel_not_an_error() {
        let (service, _, notifier) = build_service();
        let record = service
            .submit(submission(Default::default()))
            .expect("submission succeeds");

        let result = service.evaluate(&record.id).expect("evaluation succeeds");

        assert_eq!(result.decision, CareDecision::NoData);
        assert_eq!(result.confidence, 0.0);
        assert!(notifier.events().is_empty());
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use care_ai::workflows::assessment::assessment_router;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn submit_then_evaluate_then_read_status() {
        let (service, _, _) = build_service();
        let router = assessment_router(Arc::new(service));

        let submit = Request::builder()
            .method("POST")
            .uri("/api/v1/assessments")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&submission(intake_answers())).expect("serialize"),
            ))
            .expect("request");
        let response = router.clone().oneshot(submit).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let assessment_id = payload
            .get("assessment_id")
            .and_then(Value::as_str)
            .expect("tracking id")
            .to_string();

        let evaluate = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/assessments/{assessment_id}/evaluation"))
            .body(Body::empty())
            .expect("request");
        let response = router.clone().oneshot(evaluate).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let status = Request::builder()
            .method("GET")
            .uri(format!("/api/v1/assessments/{assessment_id}"))
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(status).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            payload.get("status").and_then(Value::as_str),
            Some("evaluated")
        );
        assert_eq!(
            payload.get("tier").and_then(Value::as_str),
            Some("high_acuity_memory_care")
        );
    }
}
