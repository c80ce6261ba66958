use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::normalizer::{normalize_question, normalize_response};

#[derive(Debug)]
pub(crate) struct IntakeRecord {
    pub(crate) question: String,
    pub(crate) response: String,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<IntakeRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<IntakeRow>() {
        let row = record?;
        let Some(response) = row.response else {
            continue;
        };

        records.push(IntakeRecord {
            question: normalize_question(&row.question),
            response: normalize_response(&response),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct IntakeRow {
    #[serde(rename = "Question")]
    question: String,
    #[serde(
        rename = "Response",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    response: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
