use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{AnswerSet, AssessmentId, AssessmentStatus, AssessmentSubmission, CareTier};
use super::engine::{CareDecision, DecisionEngine, DecisionResult};
use super::repository::{
    AlertError, AssessmentRecord, AssessmentRepository, CareTeamAlert, CareTeamNotifier,
    RepositoryError,
};

/// Service composing the repository, the care-team notifier, and the
/// decision engine.
pub struct AssessmentService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    engine: Arc<DecisionEngine>,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asmt-{id:06}"))
}

impl<R, N> AssessmentService<R, N>
where
    R: AssessmentRepository + 'static,
    N: CareTeamNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, engine: DecisionEngine) -> Self {
        Self {
            repository,
            notifier,
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Store a new intake submission, returning the repository-backed
    /// record.
    pub fn submit(
        &self,
        submission: AssessmentSubmission,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = AssessmentRecord {
            id: next_assessment_id(),
            submission,
            status: AssessmentStatus::Submitted,
            result: None,
        };

        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Evaluate a stored assessment and persist the outcome. Sentinel
    /// outcomes park the record in `awaiting_information` instead of
    /// failing.
    pub fn evaluate(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<DecisionResult, AssessmentServiceError> {
        let mut record = self
            .repository
            .fetch(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;

        let result = self.engine.evaluate(&record.submission.answers);

        record.status = match result.decision {
            CareDecision::Tier { .. } => AssessmentStatus::Evaluated,
            CareDecision::NoData | CareDecision::Incomplete { .. } => {
                AssessmentStatus::AwaitingInformation
            }
        };
        record.result = Some(result.clone());

        self.repository.update(record)?;

        if let CareDecision::Tier { tier, .. } = &result.decision {
            if *tier >= CareTier::MemoryCare {
                let mut details = BTreeMap::new();
                details.insert("tier".to_string(), tier.label().to_string());
                details.insert("confidence".to_string(), format!("{:.2}", result.confidence));
                self.notifier.publish(CareTeamAlert {
                    template: "high_acuity_placement".to_string(),
                    assessment_id: assessment_id.clone(),
                    details,
                })?;
            }
        }

        Ok(result)
    }

    /// Run the engine on an answer set without persisting anything.
    pub fn preview(&self, answers: &AnswerSet) -> DecisionResult {
        self.engine.evaluate(answers)
    }

    /// Fetch an assessment and current status for API responses.
    pub fn get(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = self
            .repository
            .fetch(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
