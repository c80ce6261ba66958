use crate::infra::{load_engine, InMemoryAssessmentRepository, InMemoryCareTeamNotifier};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use care_ai::config::EngineSource;
use care_ai::error::AppError;
use care_ai::workflows::assessment::{
    AnswerSet, AnswerValue, AssessmentService, AssessmentSubmission, CsvIntakeImporter,
    DecisionResult, EngineConfig,
};

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Intake CSV export (Question,Response rows) to evaluate
    pub(crate) answers: PathBuf,
    /// Assessment completion date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) completed_on: Option<NaiveDate>,
    /// Optional engine tables JSON (defaults to the built-in tables)
    #[arg(long)]
    pub(crate) tables: Option<PathBuf>,
    /// Print the full decision as JSON instead of the readable summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TablesLintArgs {
    /// Engine tables JSON to inspect (defaults to the built-in tables)
    #[arg(long)]
    pub(crate) tables: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional engine tables JSON (defaults to the built-in tables)
    #[arg(long)]
    pub(crate) tables: Option<PathBuf>,
    /// Optional intake CSV export to run through the engine as well
    #[arg(long)]
    pub(crate) intake_csv: Option<PathBuf>,
    /// Skip the built-in intake personas
    #[arg(long)]
    pub(crate) skip_personas: bool,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        answers,
        completed_on,
        tables,
        json,
    } = args;

    let engine = load_engine(&EngineSource {
        tables_path: tables,
    })?;
    let completed_on = completed_on.unwrap_or_else(|| Local::now().date_naive());
    let submission = CsvIntakeImporter::from_path(answers, completed_on)?;

    let result = engine.evaluate(&submission.answers);
    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("decision payload unavailable: {err}"),
        }
    } else {
        render_decision(&result);
    }

    Ok(())
}

pub(crate) fn run_tables_lint(args: TablesLintArgs) -> Result<(), AppError> {
    let config = match args.tables {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::standard(),
    };

    println!(
        "Tables valid: {} domains, {} scoring rows, {} rules, {} tier bands",
        config.domains.len(),
        config.scoring.len(),
        config.rules.len(),
        config.tier_bands.len()
    );

    let findings = config.lint_expressions();
    if findings.is_empty() {
        println!("Rule conditions: all parse cleanly");
    } else {
        println!("Rule conditions with problems:");
        for (rule_id, problem) in findings {
            println!("- {rule_id}: {problem}");
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        tables,
        intake_csv,
        skip_personas,
    } = args;

    println!("Care-level decision demo");
    let engine = load_engine(&EngineSource {
        tables_path: tables,
    })?;

    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let notifier = Arc::new(InMemoryCareTeamNotifier::default());
    let service = Arc::new(AssessmentService::new(
        repository.clone(),
        notifier.clone(),
        engine,
    ));

    if let Some(path) = intake_csv {
        println!("\nImported intake export");
        let completed_on = Local::now().date_naive();
        let submission = CsvIntakeImporter::from_path(path, completed_on)?;
        let result = service.preview(&submission.answers);
        render_decision(&result);
    }

    if skip_personas {
        return Ok(());
    }

    let today = Local::now().date_naive();
    for (label, answers) in demo_personas() {
        println!("\nPersona: {label}");
        let record = match service.submit(AssessmentSubmission {
            answers,
            completed_on: today,
            referral_source: Some("demo".to_string()),
        }) {
            Ok(record) => record,
            Err(err) => {
                println!("  Submission rejected: {err}");
                continue;
            }
        };
        println!("- Received assessment {} -> status {}", record.id.0, record.status.label());

        match service.evaluate(&record.id) {
            Ok(result) => render_decision(&result),
            Err(err) => println!("  Evaluation unavailable: {err}"),
        }
    }

    let events = notifier.events();
    if events.is_empty() {
        println!("\nCare-team alerts: none dispatched");
    } else {
        println!("\nCare-team alerts:");
        for alert in events {
            println!("- template={} -> {}", alert.template, alert.assessment_id.0);
        }
    }

    Ok(())
}

pub(crate) fn render_decision(result: &DecisionResult) {
    println!("  Decision: {}", result.decision.summary());
    println!(
        "  Total score {:.1} | confidence {:.2} | {} unmatched answer(s)",
        result.total_score, result.confidence, result.unmatched_answers
    );

    let scored: Vec<String> = result
        .domain_scores
        .iter()
        .filter(|(_, score)| **score > 0.0)
        .map(|(domain, score)| format!("{domain} {score:.1}"))
        .collect();
    if !scored.is_empty() {
        println!("  Domain scores: {}", scored.join(" | "));
    }

    if !result.flags.is_empty() {
        println!("  Flags: {}", result.flags.join(", "));
    }
    if !result.triggered_rules.is_empty() {
        println!("  Rules applied: {}", result.triggered_rules.join(", "));
    }
    if !result.drivers.is_empty() {
        println!("  Top drivers:");
        for driver in &result.drivers {
            println!(
                "    - {} = {} ({:+.1} points, {})",
                driver.question, driver.answer, driver.points, driver.domain
            );
        }
    }
    if !result.advisories.is_empty() {
        println!("  Advisories:");
        for advisory in &result.advisories {
            println!("    - {advisory}");
        }
    }
}

fn demo_personas() -> Vec<(&'static str, AnswerSet)> {
    let mut still_independent: AnswerSet = BTreeMap::new();
    still_independent.insert(
        "memory_changes".to_string(),
        AnswerValue::scalar("no concerns"),
    );
    still_independent.insert("badls".to_string(), AnswerValue::list(["bathing"]));
    still_independent.insert("mobility".to_string(), AnswerValue::scalar("cane"));
    still_independent.insert(
        "primary_support".to_string(),
        AnswerValue::scalar("weekly"),
    );

    let mut supported_but_frail: AnswerSet = BTreeMap::new();
    supported_but_frail.insert(
        "memory_changes".to_string(),
        AnswerValue::scalar("occasional"),
    );
    supported_but_frail.insert(
        "badls".to_string(),
        AnswerValue::list(["bathing", "dressing", "toileting", "transferring"]),
    );
    supported_but_frail.insert("mobility".to_string(), AnswerValue::scalar("walker"));
    supported_but_frail.insert("falls".to_string(), AnswerValue::scalar("one"));
    supported_but_frail.insert(
        "primary_support".to_string(),
        AnswerValue::scalar("24-hour support in place"),
    );
    supported_but_frail.insert(
        "iadls".to_string(),
        AnswerValue::list(["meals", "finances", "transportation"]),
    );
    let mut conditions = BTreeMap::new();
    conditions.insert("diabetes".to_string(), "Present".to_string());
    supported_but_frail.insert(
        "chronic_conditions".to_string(),
        AnswerValue::Map(conditions),
    );

    let mut severe_memory_loss: AnswerSet = BTreeMap::new();
    severe_memory_loss.insert(
        "memory_changes".to_string(),
        AnswerValue::scalar("severe diagnosis"),
    );
    severe_memory_loss.insert(
        "primary_support".to_string(),
        AnswerValue::scalar("none regular"),
    );
    severe_memory_loss.insert(
        "badls".to_string(),
        AnswerValue::list(["bathing", "dressing"]),
    );
    severe_memory_loss.insert("mobility".to_string(), AnswerValue::scalar("walker"));
    severe_memory_loss.insert(
        "behaviors".to_string(),
        AnswerValue::list(["wandering", "sundowning"]),
    );

    vec![
        ("still independent", still_independent),
        ("supported but frail", supported_but_frail),
        ("severe memory loss", severe_memory_loss),
    ]
}
