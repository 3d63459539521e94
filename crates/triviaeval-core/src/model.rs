//! Core data model types for triviaeval.
//!
//! These are the records that flow from the trivia API, through the CSV
//! dataset, into the evaluator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answer space of every boolean question.
pub const BOOLEAN_ANSWERS: [&str; 2] = ["True", "False"];

/// A single trivia question as served by the quiz API and stored in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaRecord {
    /// Category name (e.g. "Science: Computers").
    pub category: String,
    /// Multiple-choice or true/false.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Difficulty label ("easy", "medium", "hard").
    pub difficulty: String,
    /// The question text.
    pub question: String,
    /// The ground-truth answer.
    pub correct_answer: String,
    /// Wrong answers, in the order the API returned them.
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}

impl TriviaRecord {
    /// The set of answers the model is allowed to pick from.
    ///
    /// Boolean questions always get `["True", "False"]`, whatever the record's
    /// own `incorrect_answers` hold. Multiple-choice questions list the correct
    /// answer first, followed by the incorrect ones. That ordering is not
    /// shuffled, so the ground truth always sits in the first slot of the
    /// prompt.
    pub fn possible_answers(&self) -> Vec<String> {
        match self.kind {
            QuestionType::Boolean => BOOLEAN_ANSWERS.iter().map(|s| s.to_string()).collect(),
            QuestionType::Multiple => std::iter::once(self.correct_answer.clone())
                .chain(self.incorrect_answers.iter().cloned())
                .collect(),
        }
    }
}

/// The two question shapes the quiz API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Multiple,
    Boolean,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Multiple => write!(f, "multiple"),
            QuestionType::Boolean => write!(f, "boolean"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multiple" => Ok(QuestionType::Multiple),
            "boolean" => Ok(QuestionType::Boolean),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Status code returned by the Open Trivia DB API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ResponseCode {
    Success,
    /// Not enough questions for the query.
    NoResults,
    InvalidParameter,
    TokenNotFound,
    /// The session token has returned every available question.
    TokenEmpty,
    RateLimit,
    Other(i64),
}

impl ResponseCode {
    pub fn is_success(self) -> bool {
        self == ResponseCode::Success
    }
}

impl From<i64> for ResponseCode {
    fn from(code: i64) -> Self {
        match code {
            0 => ResponseCode::Success,
            1 => ResponseCode::NoResults,
            2 => ResponseCode::InvalidParameter,
            3 => ResponseCode::TokenNotFound,
            4 => ResponseCode::TokenEmpty,
            5 => ResponseCode::RateLimit,
            other => ResponseCode::Other(other),
        }
    }
}

impl From<ResponseCode> for i64 {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::Success => 0,
            ResponseCode::NoResults => 1,
            ResponseCode::InvalidParameter => 2,
            ResponseCode::TokenNotFound => 3,
            ResponseCode::TokenEmpty => 4,
            ResponseCode::RateLimit => 5,
            ResponseCode::Other(code) => code,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = i64::from(*self);
        match self {
            ResponseCode::Success => write!(f, "{code} (success)"),
            ResponseCode::NoResults => write!(f, "{code} (no results)"),
            ResponseCode::InvalidParameter => write!(f, "{code} (invalid parameter)"),
            ResponseCode::TokenNotFound => write!(f, "{code} (session token not found)"),
            ResponseCode::TokenEmpty => write!(f, "{code} (session token exhausted)"),
            ResponseCode::RateLimit => write!(f, "{code} (rate limited)"),
            ResponseCode::Other(_) => write!(f, "{code}"),
        }
    }
}

/// One response from the trivia API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriviaBatch {
    pub response_code: ResponseCode,
    #[serde(default)]
    pub results: Vec<TriviaRecord>,
}
