use super::common::*;
use crate::workflows::assessment::domain::{AssessmentId, AssessmentStatus, CareTier};
use crate::workflows::assessment::engine::CareDecision;
use crate::workflows::assessment::repository::{AssessmentRepository, RepositoryError};
use crate::workflows::assessment::service::AssessmentServiceError;

#[test]
fn submit_stores_a_pending_record() {
    let (service, repository, _) = build_service();

    let record = service
        .submit(submission(minimal_critical()))
        .expect("submission succeeds");

    assert_eq!(record.status, AssessmentStatus::Submitted);
    assert!(record.result.is_none());
    let stored = repository
        .fetch(&record.id)
        .expect("repository fetch")
        .expect("record present");
    assert_eq!(stored.status, AssessmentStatus::Submitted);
}

#[test]
fn evaluate_persists_the_decision_and_transitions_status() {
    let (service, repository, _) = build_service();
    let record = service
        .submit(submission(minimal_critical()))
        .expect("submission succeeds");

    let result = service.evaluate(&record.id).expect("evaluation succeeds");

    assert!(matches!(result.decision, CareDecision::Tier { .. }));
    let stored = repository
        .fetch(&record.id)
        .expect("repository fetch")
        .expect("record present");
    assert_eq!(stored.status, AssessmentStatus::Evaluated);
    assert_eq!(stored.result, Some(result));
}

#[test]
fn high_acuity_decisions_notify_the_care_team() {
    let (service, _, notifier) = build_service();
    let record = service
        .submit(submission(high_acuity_answers()))
        .expect("submission succeeds");

    let result = service.evaluate(&record.id).expect("evaluation succeeds");

    assert_eq!(result.decision.tier(), Some(CareTier::HighAcuityMemoryCare));
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "high_acuity_placement");
    assert_eq!(events[0].assessment_id, record.id);
    assert_eq!(
        events[0].details.get("tier").map(String::as_str),
        Some("high_acuity_memory_care")
    );
}

#[test]
fn low_tier_decisions_do_not_notify() {
    let (service, _, notifier) = build_service();
    let record = service
        .submit(submission(minimal_critical()))
        .expect("submission succeeds");

    service.evaluate(&record.id).expect("evaluation succeeds");

    assert!(notifier.events().is_empty());
}

#[test]
fn incomplete_submissions_park_in_awaiting_information() {
    let (service, repository, notifier) = build_service();
    let record = service
        .submit(submission(answers(vec![scalar(
            "memory_changes",
            "moderate",
        )])))
        .expect("submission succeeds");

    let result = service.evaluate(&record.id).expect("evaluation succeeds");

    assert!(matches!(result.decision, CareDecision::Incomplete { .. }));
    let stored = repository
        .fetch(&record.id)
        .expect("repository fetch")
        .expect("record present");
    assert_eq!(stored.status, AssessmentStatus::AwaitingInformation);
    assert!(notifier.events().is_empty());
}

#[test]
fn evaluating_an_unknown_assessment_fails_with_not_found() {
    let (service, _, _) = build_service();

    match service.evaluate(&AssessmentId("asmt-missing".to_string())) {
        Err(AssessmentServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not-found error, got {other:?}"),
    }
}

#[test]
fn preview_never_touches_the_repository() {
    let (service, repository, notifier) = build_service();

    let result = service.preview(&high_acuity_answers());

    assert_eq!(result.decision.tier(), Some(CareTier::HighAcuityMemoryCare));
    assert_eq!(repository.len(), 0);
    assert!(notifier.events().is_empty());
}

#[test]
fn status_view_exposes_tier_and_confidence_after_evaluation() {
    let (service, repository, _) = build_service();
    let record = service
        .submit(submission(high_acuity_answers()))
        .expect("submission succeeds");
    service.evaluate(&record.id).expect("evaluation succeeds");

    let stored = repository
        .fetch(&record.id)
        .expect("repository fetch")
        .expect("record present");
    let view = stored.status_view();

    assert_eq!(view.status, "evaluated");
    assert_eq!(view.tier, Some("high_acuity_memory_care"));
    assert!(view.confidence.unwrap_or_default() > 0.0);
    assert!(view.decision_rationale.contains("High-Acuity Memory Care"));
}
