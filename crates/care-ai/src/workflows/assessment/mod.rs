//! Care-level assessment intake, evaluation, and explanation.
//!
//! The module is built around one invariant: evaluation is a pure function
//! of (answers, tables). The canonicalizer, scorer, flag deriver, rule
//! resolver, and confidence builder live under [`engine`]; the service,
//! repository, and router wrap that engine with the intake workflow.

pub(crate) mod canonical;
pub mod domain;
pub mod engine;
pub mod intake;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerSet, AnswerValue, AssessmentId, AssessmentStatus, AssessmentSubmission, CareTier,
};
pub use engine::{
    CareDecision, DecisionEngine, DecisionResult, Driver, EngineConfig, EngineSetupError,
};
pub use intake::{CsvIntakeImporter, IntakeImportError};
pub use repository::{
    AlertError, AssessmentRecord, AssessmentRepository, AssessmentStatusView, CareTeamAlert,
    CareTeamNotifier, RepositoryError,
};
pub use router::assessment_router;
pub use service::{AssessmentService, AssessmentServiceError};
