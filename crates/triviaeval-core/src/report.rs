//! Evaluation report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{AnswerOutcome, EvaluatorConfig};
use crate::model::QuestionType;
use crate::statistics::{Breakdown, EvaluationTally, Verdict};

/// Why an evaluation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    /// Every record in the dataset was visited.
    EndOfDataset,
    /// The configured row cap was reached.
    CapReached,
}

/// What happened to one dataset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResult {
    /// 0-based position among the loaded records.
    pub index: usize,
    pub category: String,
    pub difficulty: String,
    pub kind: QuestionType,
    pub question: String,
    pub expected: String,
    pub outcome: AnswerOutcome,
    pub verdict: Verdict,
}

/// A complete evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Model that answered the questions.
    pub model: String,
    /// Dataset file the questions came from.
    pub dataset: String,
    /// Evaluator settings in effect for this run.
    pub settings: EvaluatorConfig,
    pub tally: EvaluationTally,
    /// Denominator of [`EvaluationReport::correct_percentage`].
    pub percentage_base: u64,
    pub end: RunEnd,
    /// Dataset rows the loader could not parse.
    #[serde(default)]
    pub rejected_rows: usize,
    pub results: Vec<RecordResult>,
    pub breakdown: Breakdown,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl EvaluationReport {
    /// Share of correct answers, in percent.
    pub fn correct_percentage(&self) -> f64 {
        self.tally.percentage(self.percentage_base)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
