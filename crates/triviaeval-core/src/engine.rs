//! The evaluation loop.
//!
//! Replays dataset records against a model one at a time, retries invalid
//! answers according to the configured [`RetryPolicy`], and tallies the
//! verdicts into an [`EvaluationReport`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dataset::{LoadedDataset, RejectedRow};
use crate::error::ProviderError;
use crate::model::TriviaRecord;
use crate::normalize::{normalize_answer, ParseFallback};
use crate::prompt::PromptAttempt;
use crate::report::{EvaluationReport, RecordResult, RunEnd};
use crate::statistics::{compute_breakdown, EvaluationTally, Verdict};
use crate::throttle::Throttle;
use crate::traits::{GenerateRequest, LlmProvider};

pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
/// Row cap used by the [`EvaluatorProfile::Reference`] preset.
pub const REFERENCE_ROW_CAP: usize = 50;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How a model answer is compared with the ground truth and the answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    Exact,
    CaseInsensitive,
}

impl MatchMode {
    pub fn matches(self, expected: &str, actual: &str) -> bool {
        match self {
            MatchMode::Exact => expected == actual,
            MatchMode::CaseInsensitive => expected.to_lowercase() == actual.to_lowercase(),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::CaseInsensitive => write!(f, "case-insensitive"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" | "case-sensitive" => Ok(MatchMode::Exact),
            "case-insensitive" | "ignore-case" => Ok(MatchMode::CaseInsensitive),
            other => Err(format!("unknown match mode: {other}")),
        }
    }
}

/// What to do when the model answers outside the possible-answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicy {
    /// Re-ask until an answer is accepted or `max_attempts` is used up, and
    /// score the last answer received.
    #[default]
    Await,
    /// Issue a single follow-up request but ignore its answer; the first
    /// (invalid) answer is scored. Reproduces fire-and-forget retry scoring
    /// for comparison with older runs, except that exactly one follow-up is
    /// sent and `ask` awaits it (throttle delay included) before returning.
    Discard,
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Await => write!(f, "await"),
            RetryPolicy::Discard => write!(f, "discard"),
        }
    }
}

impl FromStr for RetryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "await" | "use-corrected" => Ok(RetryPolicy::Await),
            "discard" => Ok(RetryPolicy::Discard),
            other => Err(format!("unknown retry policy: {other}")),
        }
    }
}

/// Named bundles of evaluator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluatorProfile {
    /// Whole file, exact match, lenient parsing, retries awaited.
    #[default]
    Default,
    /// First 50 scored rows, exact match, lenient parsing, retry discarded.
    Reference,
    /// Whole file, case-insensitive match, strict parsing, retry discarded.
    FullFile,
}

impl EvaluatorProfile {
    pub fn config(self) -> EvaluatorConfig {
        let base = EvaluatorConfig::default();
        match self {
            EvaluatorProfile::Default => base,
            EvaluatorProfile::Reference => EvaluatorConfig {
                row_cap: Some(REFERENCE_ROW_CAP),
                match_mode: MatchMode::Exact,
                parse_fallback: ParseFallback::LowercasedRaw,
                retry_policy: RetryPolicy::Discard,
                ..base
            },
            EvaluatorProfile::FullFile => EvaluatorConfig {
                row_cap: None,
                match_mode: MatchMode::CaseInsensitive,
                parse_fallback: ParseFallback::Empty,
                retry_policy: RetryPolicy::Discard,
                ..base
            },
        }
    }
}

impl fmt::Display for EvaluatorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorProfile::Default => write!(f, "default"),
            EvaluatorProfile::Reference => write!(f, "reference"),
            EvaluatorProfile::FullFile => write!(f, "full-file"),
        }
    }
}

impl FromStr for EvaluatorProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(EvaluatorProfile::Default),
            "reference" | "capped" => Ok(EvaluatorProfile::Reference),
            "full-file" | "full" => Ok(EvaluatorProfile::FullFile),
            other => Err(format!("unknown evaluator profile: {other}")),
        }
    }
}

/// Configuration for the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Stop after this many scored records (None = whole file).
    pub row_cap: Option<usize>,
    pub match_mode: MatchMode,
    pub parse_fallback: ParseFallback,
    pub retry_policy: RetryPolicy,
    /// Upper bound on model requests per record, first attempt included.
    pub max_attempts: u32,
    /// Minimum interval between model requests.
    pub request_delay_ms: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            row_cap: None,
            match_mode: MatchMode::Exact,
            parse_fallback: ParseFallback::LowercasedRaw,
            retry_policy: RetryPolicy::Await,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes and progress
// ---------------------------------------------------------------------------

/// Result of asking the model about one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The answer is in the possible-answer set.
    Accepted { answer: String, attempts: u32 },
    /// No attempt produced an answer from the set; `answer` is the one scored.
    Rejected { answer: String, attempts: u32 },
    /// The model could not be reached.
    Failed { error: String },
}

impl AnswerOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            AnswerOutcome::Accepted { answer, .. } | AnswerOutcome::Rejected { answer, .. } => {
                Some(answer)
            }
            AnswerOutcome::Failed { .. } => None,
        }
    }

    /// Number of model requests issued.
    pub fn attempts(&self) -> u32 {
        match self {
            AnswerOutcome::Accepted { attempts, .. } | AnswerOutcome::Rejected { attempts, .. } => {
                *attempts
            }
            AnswerOutcome::Failed { .. } => 0,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_rejected_row(&self, row: &RejectedRow);
    fn on_record_start(&self, index: usize, record: &TriviaRecord);
    fn on_record_complete(&self, result: &RecordResult);
    fn on_run_complete(&self, report: &EvaluationReport);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_rejected_row(&self, _: &RejectedRow) {}
    fn on_record_start(&self, _: usize, _: &TriviaRecord) {}
    fn on_record_complete(&self, _: &RecordResult) {}
    fn on_run_complete(&self, _: &EvaluationReport) {}
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Sequential evaluator over a loaded dataset.
pub struct Evaluator {
    provider: Arc<dyn LlmProvider>,
    config: EvaluatorConfig,
    throttle: Throttle,
}

impl Evaluator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: EvaluatorConfig) -> Self {
        let throttle = Throttle::from_millis(config.request_delay_ms);
        Self {
            provider,
            config,
            throttle,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Ask the model about `record`, retrying per the configured policy.
    ///
    /// Transient provider failures become [`AnswerOutcome::Failed`]; only
    /// permanent ones (e.g. an unknown model) are returned as `Err`.
    pub async fn ask(&self, record: &TriviaRecord) -> Result<AnswerOutcome> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = PromptAttempt::for_record(record);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let answer = match self.request(&attempt).await {
                Ok(answer) => answer,
                Err(e) => return self.failed(e),
            };

            if attempt.accepts(&answer, self.config.match_mode) {
                return Ok(AnswerOutcome::Accepted { answer, attempts });
            }

            tracing::debug!(
                attempt = attempts,
                "answer {answer:?} is not one of {:?}",
                attempt.possible_answers
            );

            match self.config.retry_policy {
                RetryPolicy::Await => {
                    if attempts >= max_attempts {
                        tracing::warn!("no valid answer after {attempts} attempt(s)");
                        return Ok(AnswerOutcome::Rejected { answer, attempts });
                    }
                    attempt = attempt.retry();
                }
                RetryPolicy::Discard => {
                    if attempts < max_attempts {
                        attempts += 1;
                        match self.request(&attempt.retry()).await {
                            Ok(ignored) => {
                                tracing::debug!("discarding follow-up answer {ignored:?}")
                            }
                            Err(e) => tracing::warn!("follow-up request failed: {e:#}"),
                        }
                    }
                    return Ok(AnswerOutcome::Rejected { answer, attempts });
                }
            }
        }
    }

    /// Compare an outcome with the record's ground truth.
    pub fn score(&self, record: &TriviaRecord, outcome: &AnswerOutcome) -> Verdict {
        match outcome {
            AnswerOutcome::Failed { error } => Verdict::Skipped {
                reason: error.clone(),
            },
            _ => match outcome.answer() {
                None | Some("") => Verdict::Skipped {
                    reason: "no answer received from model".to_string(),
                },
                Some(answer) if self.config.match_mode.matches(&record.correct_answer, answer) => {
                    Verdict::Correct
                }
                Some(answer) => Verdict::Incorrect {
                    expected: record.correct_answer.clone(),
                    received: answer.to_string(),
                },
            },
        }
    }

    /// Ask and score a single record.
    pub async fn evaluate_record(&self, index: usize, record: &TriviaRecord) -> Result<RecordResult> {
        let outcome = self.ask(record).await?;
        let verdict = self.score(record, &outcome);
        Ok(RecordResult {
            index,
            category: record.category.clone(),
            difficulty: record.difficulty.clone(),
            kind: record.kind,
            question: record.question.clone(),
            expected: record.correct_answer.clone(),
            outcome,
            verdict,
        })
    }

    /// Evaluate records in order until the dataset ends or the row cap is hit.
    ///
    /// Skipped records do not count towards the cap.
    pub async fn run(
        &self,
        dataset: &LoadedDataset,
        dataset_name: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<EvaluationReport> {
        let start = Instant::now();

        for row in &dataset.rejected {
            tracing::warn!("skipping dataset line {}: {}", row.line, row.reason);
            progress.on_rejected_row(row);
        }

        tracing::info!(
            "evaluating {} record(s) with {} via {}",
            dataset.records.len(),
            self.config.model,
            self.provider.name()
        );

        let mut tally = EvaluationTally::default();
        let mut results = Vec::new();
        let mut end = RunEnd::EndOfDataset;

        for (index, record) in dataset.records.iter().enumerate() {
            if self.cap_reached(&tally) {
                end = RunEnd::CapReached;
                break;
            }

            progress.on_record_start(index, record);
            let result = self.evaluate_record(index, record).await?;
            tally = tally.record(&result.verdict);
            progress.on_record_complete(&result);
            results.push(result);
        }

        if end == RunEnd::EndOfDataset && self.cap_reached(&tally) {
            end = RunEnd::CapReached;
        }

        let percentage_base = match (end, self.config.row_cap) {
            (RunEnd::CapReached, Some(cap)) => cap as u64,
            _ => tally.total,
        };

        let elapsed = start.elapsed();
        let report = EvaluationReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            model: self.config.model.clone(),
            dataset: dataset_name.to_string(),
            settings: self.config.clone(),
            tally,
            percentage_base,
            end,
            rejected_rows: dataset.rejected.len(),
            breakdown: compute_breakdown(&results),
            results,
            duration_ms: elapsed.as_millis() as u64,
        };

        progress.on_run_complete(&report);
        Ok(report)
    }

    async fn request(&self, attempt: &PromptAttempt<'_>) -> Result<String> {
        self.throttle.wait().await;
        let request = GenerateRequest::json(&self.config.model, attempt.render());
        let response = self.provider.generate(&request).await?;
        Ok(normalize_answer(
            &response.content,
            self.config.parse_fallback,
        ))
    }

    fn failed(&self, err: anyhow::Error) -> Result<AnswerOutcome> {
        if err
            .downcast_ref::<ProviderError>()
            .is_some_and(ProviderError::is_permanent)
        {
            return Err(err);
        }
        tracing::warn!("error while communicating with the model: {err:#}");
        Ok(AnswerOutcome::Failed {
            error: format!("{err:#}"),
        })
    }

    fn cap_reached(&self, tally: &EvaluationTally) -> bool {
        self.config
            .row_cap
            .is_some_and(|cap| tally.total >= cap as u64)
    }
}
