use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::QuestionId;

#[derive(Debug)]
pub enum AnswerSheetError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for AnswerSheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerSheetError::Io(err) => write!(f, "failed to read answer sheet: {}", err),
            AnswerSheetError::Csv(err) => write!(f, "invalid answer sheet CSV: {}", err),
        }
    }
}

impl std::error::Error for AnswerSheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnswerSheetError::Io(err) => Some(err),
            AnswerSheetError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AnswerSheetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for AnswerSheetError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One `question_id,value` row of an offline answer sheet.
///
/// Values are kept wide so range checks happen at the service boundary like any other
/// submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheetEntry {
    pub question_id: QuestionId,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
struct AnswerRow {
    question_id: String,
    value: i64,
}

pub fn parse_answer_sheet<R: Read>(reader: R) -> Result<Vec<AnswerSheetEntry>, AnswerSheetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut entries = Vec::new();

    for record in csv_reader.deserialize::<AnswerRow>() {
        let row = record?;
        if row.question_id.is_empty() {
            continue;
        }
        entries.push(AnswerSheetEntry {
            question_id: QuestionId(row.question_id),
            value: row.value,
        });
    }

    Ok(entries)
}

pub fn read_answer_sheet<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<AnswerSheetEntry>, AnswerSheetError> {
    let file = std::fs::File::open(path)?;
    parse_answer_sheet(file)
}
