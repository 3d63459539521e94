//! End-to-end pipeline tests: collect into a dataset, then evaluate it.
//!
//! Both external services are replaced with the in-process mocks, so these
//! run without network access.

use std::sync::Arc;

use triviaeval_core::collector::{Collector, CollectorConfig, StopReason};
use triviaeval_core::dataset::DatasetStore;
use triviaeval_core::engine::{
    Evaluator, EvaluatorConfig, EvaluatorProfile, MatchMode, NoopReporter, RetryPolicy,
};
use triviaeval_core::model::{QuestionType, ResponseCode, TriviaRecord};
use triviaeval_core::normalize::ParseFallback;
use triviaeval_core::report::{EvaluationReport, RunEnd};
use triviaeval_core::statistics::Verdict;
use triviaeval_providers::mock::{MockProvider, MockTriviaSource};

fn multiple(question: &str, correct: &str, difficulty: &str) -> TriviaRecord {
    TriviaRecord {
        category: "General Knowledge".into(),
        kind: QuestionType::Multiple,
        difficulty: difficulty.into(),
        question: question.into(),
        correct_answer: correct.into(),
        incorrect_answers: vec!["Wrong A".into(), "Wrong B".into(), "Wrong C".into()],
    }
}

fn boolean(question: &str, correct: &str) -> TriviaRecord {
    TriviaRecord {
        category: "Science".into(),
        kind: QuestionType::Boolean,
        difficulty: "easy".into(),
        question: question.into(),
        correct_answer: correct.into(),
        incorrect_answers: vec![if correct == "True" { "False" } else { "True" }.into()],
    }
}

fn fast_config() -> EvaluatorConfig {
    EvaluatorConfig {
        request_delay_ms: 0,
        ..EvaluatorConfig::default()
    }
}

fn collector_config() -> CollectorConfig {
    CollectorConfig {
        poll_delay_ms: 0,
        ..CollectorConfig::default()
    }
}

async fn collect(
    source: MockTriviaSource,
    store: &DatasetStore,
) -> (Arc<MockTriviaSource>, StopReason, usize) {
    let source = Arc::new(source);
    let collector = Collector::new(source.clone(), store.clone(), collector_config());
    let summary = collector.run().await.unwrap();
    (source, summary.stop_reason, summary.appended)
}

// --- Collection ---

#[tokio::test]
async fn e2e_collect_appends_rows_in_field_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("trivia_data.csv"));

    let source = MockTriviaSource::new()
        .with_batch(vec![multiple("Largest planet?", "Jupiter", "easy")])
        .with_batch(vec![boolean("The sun is a star.", "True")]);
    let (source, stop, appended) = collect(source, &store).await;

    assert_eq!(appended, 2);
    assert_eq!(source.fetch_count(), 3);
    assert_eq!(
        stop,
        StopReason::ApiStatus {
            code: ResponseCode::TokenEmpty
        }
    );

    let content = std::fs::read_to_string(store.path()).unwrap();
    let first_line = content.lines().next().unwrap();
    assert_eq!(
        first_line,
        "\"General Knowledge\",\"multiple\",\"easy\",\"Largest planet?\",\"Jupiter\",\"[\"\"Wrong A\"\",\"\"Wrong B\"\",\"\"Wrong C\"\"]\""
    );
    assert_eq!(store.load().unwrap().records.len(), 2);
}

#[tokio::test]
async fn e2e_collect_stops_without_writing_on_api_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("trivia_data.csv"));

    let source = MockTriviaSource::new().with_status(ResponseCode::RateLimit);
    let (source, stop, appended) = collect(source, &store).await;

    assert_eq!(appended, 0);
    assert_eq!(source.fetch_count(), 1);
    assert!(stop.is_no_more_data());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn e2e_collect_stops_on_network_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("trivia_data.csv"));

    let source = MockTriviaSource::new()
        .with_batch(vec![multiple("Kept?", "Yes", "easy")])
        .with_network_error("connection reset");
    let (_, stop, appended) = collect(source, &store).await;

    assert_eq!(appended, 1);
    assert!(matches!(stop, StopReason::Fetch { ref error } if error.contains("connection reset")));
}

// --- Evaluation ---

#[tokio::test]
async fn e2e_collect_then_evaluate_all_correct() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("trivia_data.csv"));

    let source = MockTriviaSource::new().with_batch(vec![
        multiple("Largest planet?", "Jupiter", "easy"),
        multiple("Smallest prime?", "2", "medium"),
        multiple("Chemical symbol for gold?", "Au", "hard"),
    ]);
    collect(source, &store).await;

    let provider = Arc::new(MockProvider::answering(&[
        ("Largest planet?", "Jupiter"),
        ("Smallest prime?", "2"),
        ("Chemical symbol for gold?", "Au"),
    ]));
    let evaluator = Evaluator::new(provider.clone(), fast_config());
    let dataset = store.load().unwrap();
    let report = evaluator
        .run(&dataset, "trivia_data.csv", &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.tally.correct, 3);
    assert_eq!(report.tally.incorrect, 0);
    assert_eq!(report.percentage_base, 3);
    assert_eq!(report.end, RunEnd::EndOfDataset);
    assert!((report.correct_percentage() - 100.0).abs() < f64::EPSILON);
    assert_eq!(provider.call_count(), 3);
    assert_eq!(report.breakdown.per_difficulty.len(), 3);
}

#[tokio::test]
async fn e2e_row_cap_stops_early() {
    let records: Vec<TriviaRecord> = (0..5)
        .map(|i| multiple(&format!("Question number {i}?"), "Right", "easy"))
        .collect();
    let dataset = triviaeval_core::dataset::LoadedDataset {
        records,
        rejected: vec![],
    };

    let provider = Arc::new(MockProvider::with_fixed_response(r#"{"answer": "Right"}"#));
    let config = EvaluatorConfig {
        row_cap: Some(2),
        ..fast_config()
    };
    let report = Evaluator::new(provider.clone(), config)
        .run(&dataset, "capped", &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.tally.total, 2);
    assert_eq!(report.percentage_base, 2);
    assert_eq!(report.end, RunEnd::CapReached);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn e2e_boolean_question_offers_only_true_false() {
    let dataset = triviaeval_core::dataset::LoadedDataset {
        records: vec![boolean("Bats are blind.", "False")],
        rejected: vec![],
    };

    let provider = Arc::new(MockProvider::with_fixed_response(r#"{"answer": "False"}"#));
    let report = Evaluator::new(provider.clone(), fast_config())
        .run(&dataset, "boolean", &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.tally.correct, 1);
    let prompt = provider.last_request().unwrap().prompt;
    assert!(prompt.contains("Bats are blind."));
    assert!(prompt.contains("True"));
    assert!(prompt.contains("False"));
    assert!(!prompt.contains("Wrong A"));
}

#[tokio::test]
async fn e2e_retry_recovers_from_invalid_answer() {
    let dataset = triviaeval_core::dataset::LoadedDataset {
        records: vec![multiple("Largest planet?", "Jupiter", "easy")],
        rejected: vec![],
    };

    let provider = Arc::new(
        MockProvider::with_fixed_response(r#"{"answer": "Jupiter"}"#)
            .with_queued(&[r#"{"answer": "Pluto"}"#]),
    );
    let report = Evaluator::new(provider.clone(), fast_config())
        .run(&dataset, "retry", &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.tally.correct, 1);
    assert_eq!(report.results[0].outcome.attempts(), 2);
    assert!(provider
        .last_request()
        .unwrap()
        .prompt
        .contains("Please try again"));
}

#[tokio::test]
async fn e2e_discard_policy_scores_first_answer() {
    let dataset = triviaeval_core::dataset::LoadedDataset {
        records: vec![multiple("Largest planet?", "Jupiter", "easy")],
        rejected: vec![],
    };

    let provider = Arc::new(
        MockProvider::with_fixed_response(r#"{"answer": "Jupiter"}"#)
            .with_queued(&[r#"{"answer": "Pluto"}"#]),
    );
    let config = EvaluatorConfig {
        retry_policy: RetryPolicy::Discard,
        ..fast_config()
    };
    let report = Evaluator::new(provider.clone(), config)
        .run(&dataset, "discard", &NoopReporter)
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 2);
    assert_eq!(
        report.results[0].verdict,
        Verdict::Incorrect {
            expected: "Jupiter".into(),
            received: "Pluto".into(),
        }
    );
}

#[tokio::test]
async fn e2e_full_file_profile_is_case_insensitive_and_strict() {
    let dataset = triviaeval_core::dataset::LoadedDataset {
        records: vec![
            multiple("Largest planet?", "Jupiter", "easy"),
            multiple("Smallest prime?", "2", "easy"),
        ],
        rejected: vec![],
    };

    let provider = Arc::new(MockProvider::new(
        [
            ("Largest planet?".to_string(), r#"{"answer": "JUPITER"}"#.to_string()),
            ("Smallest prime?".to_string(), "two, obviously".to_string()),
        ]
        .into_iter()
        .collect(),
    ));
    let config = EvaluatorConfig {
        request_delay_ms: 0,
        ..EvaluatorProfile::FullFile.config()
    };
    assert_eq!(config.match_mode, MatchMode::CaseInsensitive);
    assert_eq!(config.parse_fallback, ParseFallback::Empty);

    let report = Evaluator::new(provider, config)
        .run(&dataset, "full", &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.tally.correct, 1);
    assert_eq!(report.tally.skipped, 1);
    assert_eq!(report.tally.total, 1);
}

#[tokio::test]
async fn e2e_report_round_trips_through_json() {
    let dataset = triviaeval_core::dataset::LoadedDataset {
        records: vec![multiple("Largest planet?", "Jupiter", "easy")],
        rejected: vec![],
    };
    let provider = Arc::new(MockProvider::answering(&[("Largest planet?", "Jupiter")]));
    let report = Evaluator::new(provider, fast_config())
        .run(&dataset, "saved", &NoopReporter)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("run.json");
    report.save_json(&path).unwrap();

    let loaded = EvaluationReport::load_json(&path).unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.tally, report.tally);
    assert_eq!(loaded.settings, report.settings);
    assert_eq!(loaded.results.len(), 1);
}
