//! Append-only CSV dataset of trivia records.
//!
//! Rows have no header and a fixed column order:
//! `category, type, difficulty, question, correct_answer, incorrect_answers`,
//! where `incorrect_answers` is a JSON array encoded in a single cell. Every
//! field is quoted.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::model::{QuestionType, TriviaRecord, BOOLEAN_ANSWERS};

const COLUMNS: usize = 6;

/// A row that could not be turned into a [`TriviaRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based line number in the file.
    pub line: u64,
    pub reason: String,
}

/// Everything read back from a dataset file.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub records: Vec<TriviaRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Handle on the dataset file.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records as one row each, creating the file if needed.
    ///
    /// Returns the number of rows written.
    pub fn append(&self, records: &[TriviaRecord]) -> Result<usize, DatasetError> {
        if records.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(file);

        for record in records {
            let incorrect = serde_json::to_string(&record.incorrect_answers)?;
            let kind = record.kind.to_string();
            writer
                .write_record([
                    record.category.as_str(),
                    kind.as_str(),
                    record.difficulty.as_str(),
                    record.question.as_str(),
                    record.correct_answer.as_str(),
                    incorrect.as_str(),
                ])
                .map_err(|source| self.csv_error(source))?;
        }

        writer.flush().map_err(|source| self.io_error(source))?;
        Ok(records.len())
    }

    /// Read the whole file.
    ///
    /// Rows with an unknown question type, a malformed `incorrect_answers`
    /// cell, or the wrong number of columns are collected in
    /// [`LoadedDataset::rejected`] instead of failing the load.
    pub fn load(&self) -> Result<LoadedDataset, DatasetError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| self.csv_error(source))?;

        let mut dataset = LoadedDataset::default();
        for (index, row) in reader.records().enumerate() {
            let fallback_line = index as u64 + 1;
            match row {
                Ok(row) => {
                    let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);
                    match parse_row(&row) {
                        Ok(record) => dataset.records.push(record),
                        Err(reason) => dataset.rejected.push(RejectedRow { line, reason }),
                    }
                }
                Err(e) if e.is_io_error() => return Err(self.csv_error(e)),
                Err(e) => dataset.rejected.push(RejectedRow {
                    line: e
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(fallback_line),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(dataset)
    }

    fn io_error(&self, source: std::io::Error) -> DatasetError {
        DatasetError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> DatasetError {
        DatasetError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

/// A consistency problem found in a loaded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// 0-based position among the loaded records.
    pub index: usize,
    pub message: String,
}

/// Check loaded records against the answer-space rules.
///
/// - boolean: the correct answer must be "True" or "False"
/// - multiple: at least one incorrect answer, none equal to the correct one
/// - the same question text should appear only once
pub fn validate_records(records: &[TriviaRecord]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let mut warn = |message: String| warnings.push(ValidationWarning { index, message });

        match record.kind {
            QuestionType::Boolean => {
                if !BOOLEAN_ANSWERS.contains(&record.correct_answer.as_str()) {
                    warn(format!(
                        "boolean question has correct answer {:?}, expected True or False",
                        record.correct_answer
                    ));
                }
            }
            QuestionType::Multiple => {
                if record.incorrect_answers.is_empty() {
                    warn("multiple-choice question has no incorrect answers".to_string());
                }
                if record.incorrect_answers.contains(&record.correct_answer) {
                    warn(format!(
                        "correct answer {:?} is also listed as incorrect",
                        record.correct_answer
                    ));
                }
            }
        }

        if record.question.trim().is_empty() {
            warn("question text is empty".to_string());
        }
        if !seen.insert(record.question.as_str()) {
            warn("duplicate question".to_string());
        }
    }

    warnings
}

fn parse_row(row: &StringRecord) -> Result<TriviaRecord, String> {
    if row.len() != COLUMNS {
        return Err(format!("expected {COLUMNS} columns, found {}", row.len()));
    }

    let kind: QuestionType = row[1].parse()?;
    let incorrect_answers = if row[5].trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str::<Vec<String>>(&row[5])
            .map_err(|e| format!("incorrect_answers is not a JSON string array: {e}"))?
    };

    Ok(TriviaRecord {
        category: row[0].to_string(),
        kind,
        difficulty: row[2].to_string(),
        question: row[3].to_string(),
        correct_answer: row[4].to_string(),
        incorrect_answers,
    })
}
