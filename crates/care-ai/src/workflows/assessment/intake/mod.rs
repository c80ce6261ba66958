//! Import of legacy intake-tool CSV exports.
//!
//! The export is a flat `Question,Response` sheet: repeated questions
//! accumulate into multi-select lists, `question.item` rows fold into a
//! matrix answer, semicolon-separated responses expand into lists, and
//! bare yes/no responses become booleans. The importer only shapes the
//! data; canonicalization happens inside the engine.

mod normalizer;
mod parser;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use super::domain::{AnswerSet, AnswerValue, AssessmentSubmission};

#[derive(Debug)]
pub enum IntakeImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    NoAnswers,
}

impl std::fmt::Display for IntakeImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeImportError::Io(err) => write!(f, "failed to read intake export: {}", err),
            IntakeImportError::Csv(err) => write!(f, "invalid intake CSV data: {}", err),
            IntakeImportError::NoAnswers => {
                write!(f, "intake export contained no answered questions")
            }
        }
    }
}

impl std::error::Error for IntakeImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeImportError::Io(err) => Some(err),
            IntakeImportError::Csv(err) => Some(err),
            IntakeImportError::NoAnswers => None,
        }
    }
}

impl From<std::io::Error> for IntakeImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct CsvIntakeImporter;

impl CsvIntakeImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        completed_on: NaiveDate,
    ) -> Result<AssessmentSubmission, IntakeImportError> {
        let file = File::open(path)?;
        Self::from_reader(file, completed_on)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        completed_on: NaiveDate,
    ) -> Result<AssessmentSubmission, IntakeImportError> {
        let records = parser::parse_records(reader)?;

        let mut answers: AnswerSet = BTreeMap::new();
        for record in records {
            if let Some((question, item)) = record.question.split_once('.') {
                insert_matrix(&mut answers, question, item, &record.response);
            } else {
                insert_value(&mut answers, &record.question, &record.response);
            }
        }

        if answers.is_empty() {
            return Err(IntakeImportError::NoAnswers);
        }

        Ok(AssessmentSubmission {
            answers,
            completed_on,
            referral_source: None,
        })
    }
}

fn insert_matrix(answers: &mut AnswerSet, question: &str, item: &str, response: &str) {
    let entry = answers
        .entry(question.to_string())
        .or_insert_with(|| AnswerValue::Map(BTreeMap::new()));
    if let AnswerValue::Map(map) = entry {
        map.insert(item.to_string(), response.to_string());
    }
}

fn insert_value(answers: &mut AnswerSet, question: &str, response: &str) {
    if response.contains(';') {
        let items: Vec<String> = response
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        merge_list(answers, question, items);
        return;
    }

    let lowered = response.to_ascii_lowercase();
    let parsed = match lowered.as_str() {
        "yes" | "true" => Some(AnswerValue::Bool(true)),
        "no" | "false" => Some(AnswerValue::Bool(false)),
        _ => None,
    };
    if let Some(value) = parsed {
        answers.insert(question.to_string(), value);
        return;
    }

    match answers.remove(question) {
        None => {
            answers.insert(question.to_string(), AnswerValue::scalar(response));
        }
        Some(AnswerValue::Scalar(previous)) => {
            answers.insert(
                question.to_string(),
                AnswerValue::List(vec![previous, response.to_string()]),
            );
        }
        Some(AnswerValue::List(mut items)) => {
            items.push(response.to_string());
            answers.insert(question.to_string(), AnswerValue::List(items));
        }
        // A scalar row after a matrix/bool row wins; the export is
        // append-ordered and the last writer reflects the latest edit.
        Some(_) => {
            answers.insert(question.to_string(), AnswerValue::scalar(response));
        }
    }
}

fn merge_list(answers: &mut AnswerSet, question: &str, items: Vec<String>) {
    match answers.remove(question) {
        Some(AnswerValue::List(mut existing)) => {
            existing.extend(items);
            answers.insert(question.to_string(), AnswerValue::List(existing));
        }
        Some(AnswerValue::Scalar(previous)) => {
            let mut merged = vec![previous];
            merged.extend(items);
            answers.insert(question.to_string(), AnswerValue::List(merged));
        }
        _ => {
            answers.insert(question.to_string(), AnswerValue::List(items));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
    }

    #[test]
    fn repeated_questions_become_lists() {
        let csv = "Question,Response\nbadls,bathing\nbadls,dressing\n";
        let submission =
            CsvIntakeImporter::from_reader(csv.as_bytes(), date()).expect("import succeeds");
        assert_eq!(
            submission.answers.get("badls"),
            Some(&AnswerValue::list(["bathing", "dressing"]))
        );
    }

    #[test]
    fn dotted_questions_fold_into_a_matrix() {
        let csv =
            "Question,Response\nchronic_conditions.chf,Present\nchronic_conditions.copd,Absent\n";
        let submission =
            CsvIntakeImporter::from_reader(csv.as_bytes(), date()).expect("import succeeds");
        match submission.answers.get("chronic_conditions") {
            Some(AnswerValue::Map(map)) => {
                assert_eq!(map.get("chf").map(String::as_str), Some("Present"));
                assert_eq!(map.get("copd").map(String::as_str), Some("Absent"));
            }
            other => panic!("expected matrix answer, got {other:?}"),
        }
    }

    #[test]
    fn semicolon_responses_expand_to_lists() {
        let csv = "Question,Response\niadls,meals; finances ;transportation\n";
        let submission =
            CsvIntakeImporter::from_reader(csv.as_bytes(), date()).expect("import succeeds");
        assert_eq!(
            submission.answers.get("iadls"),
            Some(&AnswerValue::list(["meals", "finances", "transportation"]))
        );
    }

    #[test]
    fn yes_no_responses_become_booleans() {
        let csv = "Question,Response\nlives_alone,Yes\n";
        let submission =
            CsvIntakeImporter::from_reader(csv.as_bytes(), date()).expect("import succeeds");
        assert_eq!(
            submission.answers.get("lives_alone"),
            Some(&AnswerValue::Bool(true))
        );
    }

    #[test]
    fn empty_export_is_rejected() {
        let csv = "Question,Response\n";
        match CsvIntakeImporter::from_reader(csv.as_bytes(), date()) {
            Err(IntakeImportError::NoAnswers) => {}
            other => panic!("expected NoAnswers error, got {other:?}"),
        }
    }
}
