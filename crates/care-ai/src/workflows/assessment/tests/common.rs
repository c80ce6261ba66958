use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::assessment::domain::{
    AnswerSet, AnswerValue, AssessmentId, AssessmentSubmission,
};
use crate::workflows::assessment::engine::{DecisionEngine, EngineConfig};
use crate::workflows::assessment::repository::{
    AlertError, AssessmentRecord, AssessmentRepository, CareTeamAlert, CareTeamNotifier,
    RepositoryError,
};
use crate::workflows::assessment::service::AssessmentService;
use crate::workflows::assessment::{assessment_router, AssessmentStatus};

pub(super) fn standard_config() -> EngineConfig {
    EngineConfig::standard()
}

pub(super) fn engine() -> DecisionEngine {
    DecisionEngine::new(standard_config()).expect("standard tables validate")
}

pub(super) fn engine_with(config: EngineConfig) -> DecisionEngine {
    DecisionEngine::new(config).expect("custom tables validate")
}

pub(super) fn scalar(question: &str, value: &str) -> (String, AnswerValue) {
    (question.to_string(), AnswerValue::scalar(value))
}

pub(super) fn answers(entries: Vec<(String, AnswerValue)>) -> AnswerSet {
    entries.into_iter().collect()
}

/// All critical questions answered at their lowest-need values.
pub(super) fn minimal_critical() -> AnswerSet {
    answers(vec![
        scalar("memory_changes", "none"),
        ("badls".to_string(), AnswerValue::list(["bathing"])),
        scalar("mobility", "independent"),
        scalar("primary_support", "daily"),
    ])
}

/// Severe cognition with no regular support, other criticals minimal.
pub(super) fn high_acuity_answers() -> AnswerSet {
    answers(vec![
        scalar("memory_changes", "severe diagnosis"),
        scalar("primary_support", "none regular"),
        ("badls".to_string(), AnswerValue::list(["bathing"])),
        scalar("mobility", "independent"),
    ])
}

pub(super) fn submission(answers: AnswerSet) -> AssessmentSubmission {
    AssessmentSubmission {
        answers,
        completed_on: NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date"),
        referral_source: Some("hospital discharge".to_string()),
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

pub(super) fn build_router() -> axum::Router {
    let (service, _, _) = build_service();
    assessment_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<AssessmentId, AssessmentRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl AssessmentRepository for MemoryRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn pending(&self, _limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.status == AssessmentStatus::Submitted)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<CareTeamAlert>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<CareTeamAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl CareTeamNotifier for MemoryNotifier {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
