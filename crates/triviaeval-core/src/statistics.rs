//! Scoring tallies and per-category breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::RecordResult;

/// How one record was scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect { expected: String, received: String },
    /// Not scored: no answer came back from the model.
    Skipped { reason: String },
}

impl Verdict {
    pub fn is_scored(&self) -> bool {
        !matches!(self, Verdict::Skipped { .. })
    }
}

/// Running count of scored answers.
///
/// `total` counts scored records only (`correct + incorrect`); skipped
/// records are tracked separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTally {
    pub correct: u64,
    pub incorrect: u64,
    pub skipped: u64,
    pub total: u64,
}

impl EvaluationTally {
    /// Return the tally with one more verdict applied.
    #[must_use]
    pub fn record(self, verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Correct => Self {
                correct: self.correct + 1,
                total: self.total + 1,
                ..self
            },
            Verdict::Incorrect { .. } => Self {
                incorrect: self.incorrect + 1,
                total: self.total + 1,
                ..self
            },
            Verdict::Skipped { .. } => Self {
                skipped: self.skipped + 1,
                ..self
            },
        }
    }

    /// Percentage of correct answers against `base` scored questions.
    pub fn percentage(&self, base: u64) -> f64 {
        if base == 0 {
            return 0.0;
        }
        self.correct as f64 / base as f64 * 100.0
    }
}

/// Correct/incorrect counts per category and per difficulty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Breakdown {
    pub per_category: BTreeMap<String, EvaluationTally>,
    pub per_difficulty: BTreeMap<String, EvaluationTally>,
}

/// Group results by category and difficulty.
pub fn compute_breakdown(results: &[RecordResult]) -> Breakdown {
    let mut breakdown = Breakdown::default();
    for result in results {
        let category = breakdown
            .per_category
            .entry(result.category.clone())
            .or_default();
        *category = category.record(&result.verdict);

        let difficulty = breakdown
            .per_difficulty
            .entry(result.difficulty.clone())
            .or_default();
        *difficulty = difficulty.record(&result.verdict);
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnswerOutcome;
    use crate::model::QuestionType;

    fn incorrect() -> Verdict {
        Verdict::Incorrect {
            expected: "Paris".into(),
            received: "Lyon".into(),
        }
    }

    #[test]
    fn tally_counts_each_verdict() {
        let tally = EvaluationTally::default()
            .record(&Verdict::Correct)
            .record(&Verdict::Correct)
            .record(&incorrect())
            .record(&Verdict::Skipped {
                reason: "no answer".into(),
            });
        assert_eq!(tally.correct, 2);
        assert_eq!(tally.incorrect, 1);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.total, 3);
    }

    #[test]
    fn percentage_against_base() {
        let tally = EvaluationTally::default()
            .record(&Verdict::Correct)
            .record(&incorrect());
        assert!((tally.percentage(2) - 50.0).abs() < 1e-9);
        assert!((tally.percentage(4) - 25.0).abs() < 1e-9);
        assert_eq!(tally.percentage(0), 0.0);
    }

    #[test]
    fn breakdown_groups_by_category_and_difficulty() {
        let result = |category: &str, difficulty: &str, verdict: Verdict| RecordResult {
            index: 0,
            category: category.into(),
            difficulty: difficulty.into(),
            kind: QuestionType::Multiple,
            question: "Q".into(),
            expected: "Paris".into(),
            outcome: AnswerOutcome::Failed {
                error: String::new(),
            },
            verdict,
        };
        let results = vec![
            result("Geography", "easy", Verdict::Correct),
            result("Geography", "hard", incorrect()),
            result("History", "easy", Verdict::Correct),
        ];

        let breakdown = compute_breakdown(&results);
        assert_eq!(breakdown.per_category["Geography"].total, 2);
        assert_eq!(breakdown.per_category["Geography"].correct, 1);
        assert_eq!(breakdown.per_category["History"].correct, 1);
        assert_eq!(breakdown.per_difficulty["easy"].correct, 2);
        assert_eq!(breakdown.per_difficulty["hard"].incorrect, 1);
    }
}
