use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{AssessmentId, AssessmentStatus, AssessmentSubmission};
use super::engine::DecisionResult;

/// Repository record containing the submission, decision, and status
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: AssessmentId,
    pub submission: AssessmentSubmission,
    pub status: AssessmentStatus,
    pub result: Option<DecisionResult>,
}

impl AssessmentRecord {
    pub fn decision_rationale(&self) -> String {
        match &self.result {
            Some(result) => result.decision.summary(),
            None => "pending evaluation".to_string(),
        }
    }

    pub fn status_view(&self) -> AssessmentStatusView {
        AssessmentStatusView {
            assessment_id: self.id.clone(),
            status: self.status.label(),
            decision_rationale: self.decision_rationale(),
            tier: self
                .result
                .as_ref()
                .and_then(|result| result.decision.tier())
                .map(|tier| tier.label()),
            confidence: self.result.as_ref().map(|result| result.confidence),
        }
    }
}

/// Storage abstraction so the service module can be exercised in
/// isolation.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn pending(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook notifying the placement team about results that need a
/// human follow-up (e.g. high-acuity recommendations).
pub trait CareTeamNotifier: Send + Sync {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError>;
}

/// Alert payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareTeamAlert {
    pub template: String,
    pub assessment_id: AssessmentId,
    pub details: BTreeMap<String, String>,
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an assessment's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentStatusView {
    pub assessment_id: AssessmentId,
    pub status: &'static str,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}
