use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use care_ai::config::EngineSource;
use care_ai::error::AppError;
use care_ai::workflows::assessment::{
    AlertError, AssessmentId, AssessmentRecord, AssessmentRepository, AssessmentStatus,
    CareTeamAlert, CareTeamNotifier, DecisionEngine, EngineConfig, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentRepository {
    records: Arc<Mutex<HashMap<AssessmentId, AssessmentRecord>>>,
}

impl AssessmentRepository for InMemoryAssessmentRepository {
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
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
pub(crate) struct InMemoryCareTeamNotifier {
    events: Arc<Mutex<Vec<CareTeamAlert>>>,
}

impl CareTeamNotifier for InMemoryCareTeamNotifier {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError> {
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryCareTeamNotifier {
    pub(crate) fn events(&self) -> Vec<CareTeamAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

/// Builds the engine from the configured table source. Any table problem
/// is fatal here: the service must refuse to start rather than score with
/// broken tables.
pub(crate) fn load_engine(source: &EngineSource) -> Result<DecisionEngine, AppError> {
    let config = match &source.tables_path {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::standard(),
    };
    DecisionEngine::new(config).map_err(AppError::from)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
