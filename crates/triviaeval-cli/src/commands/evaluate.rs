//! The `triviaeval evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use triviaeval_core::dataset::{DatasetStore, RejectedRow};
use triviaeval_core::engine::{Evaluator, ProgressReporter};
use triviaeval_core::model::TriviaRecord;
use triviaeval_core::report::{EvaluationReport, RecordResult, RunEnd};
use triviaeval_core::statistics::Verdict;
use triviaeval_providers::config::load_config_from;
use triviaeval_providers::create_provider;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_rejected_row(&self, row: &RejectedRow) {
        eprintln!("  Skipping line {}: {}", row.line, row.reason);
    }

    fn on_record_start(&self, index: usize, record: &TriviaRecord) {
        eprintln!("\nQuestion {}: {}", index + 1, record.question);
    }

    fn on_record_complete(&self, result: &RecordResult) {
        match &result.verdict {
            Verdict::Correct => eprintln!("  Correct!"),
            Verdict::Incorrect { expected, received } => {
                eprintln!("  Incorrect. | Expected: {expected} | Received: {received}")
            }
            Verdict::Skipped { reason } => eprintln!("  No answer received from LLM ({reason})"),
        }
    }

    fn on_run_complete(&self, report: &EvaluationReport) {
        eprintln!("\n--- Evaluation Complete ---");
        eprintln!("Total Questions: {}", report.percentage_base);
        eprintln!("Correct percentage: {:.2}%", report.correct_percentage());
        if report.end == RunEnd::CapReached {
            eprintln!("(row cap reached)");
        }
    }
}

pub struct EvaluateArgs {
    pub config: Option<PathBuf>,
    pub dataset: Option<PathBuf>,
    pub model: Option<String>,
    pub profile: Option<String>,
    pub row_cap: Option<usize>,
    pub no_cap: bool,
    pub match_mode: Option<String>,
    pub parse_fallback: Option<String>,
    pub retry_policy: Option<String>,
    pub max_attempts: Option<u32>,
    pub request_delay_ms: Option<u64>,
    pub output: Option<PathBuf>,
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;

    // CLI flags override the config file.
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }
    if let Some(model) = args.model {
        config.model_name = model;
    }
    if let Some(profile) = &args.profile {
        config.evaluator.profile = profile.parse().map_err(anyhow::Error::msg)?;
    }
    if args.row_cap.is_some() {
        config.row_cap = args.row_cap;
    }
    if let Some(mode) = &args.match_mode {
        config.evaluator.match_mode = Some(mode.parse().map_err(anyhow::Error::msg)?);
    }
    if let Some(fallback) = &args.parse_fallback {
        config.evaluator.parse_fallback = Some(fallback.parse().map_err(anyhow::Error::msg)?);
    }
    if let Some(policy) = &args.retry_policy {
        config.evaluator.retry_policy = Some(policy.parse().map_err(anyhow::Error::msg)?);
    }
    if args.max_attempts.is_some() {
        config.evaluator.max_attempts = args.max_attempts;
    }
    if let Some(delay) = args.request_delay_ms {
        config.request_delay_ms = delay;
    }

    let mut evaluator_config = config.evaluator_config();
    if args.no_cap {
        evaluator_config.row_cap = None;
    }

    anyhow::ensure!(evaluator_config.max_attempts >= 1, "max attempts must be at least 1");
    anyhow::ensure!(
        evaluator_config.row_cap != Some(0),
        "row cap must be at least 1"
    );

    let store = DatasetStore::new(&config.dataset);
    let dataset = store
        .load()
        .with_context(|| format!("failed to load dataset {}", config.dataset.display()))?;

    eprintln!(
        "triviaeval v{} — Evaluating {} question(s) with {} ({} match, {} retry, fallback {})",
        env!("CARGO_PKG_VERSION"),
        dataset.records.len(),
        evaluator_config.model,
        evaluator_config.match_mode,
        evaluator_config.retry_policy,
        evaluator_config.parse_fallback,
    );

    let provider = create_provider(&config)?;
    let evaluator = Evaluator::new(provider, evaluator_config);
    let dataset_name = config.dataset.display().to_string();
    let report = evaluator
        .run(&dataset, &dataset_name, &ConsoleReporter)
        .await?;

    print_summary(&report);

    if let Some(path) = &args.output {
        tracing::debug!("writing report {} to {}", report.id, path.display());
        report.save_json(path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Model", "Correct", "Incorrect", "Skipped", "Score", "Time"]);
    table.add_row(vec![
        Cell::new(&report.model),
        Cell::new(report.tally.correct),
        Cell::new(report.tally.incorrect),
        Cell::new(report.tally.skipped),
        Cell::new(format!(
            "{:.2}% of {}",
            report.correct_percentage(),
            report.percentage_base
        )),
        Cell::new(format!("{:.1}s", report.duration_ms as f64 / 1000.0)),
    ]);
    eprintln!("\n{table}");

    if report.breakdown.per_difficulty.len() > 1 {
        let mut difficulty = Table::new();
        difficulty.set_header(vec!["Difficulty", "Correct", "Scored", "Score"]);
        for (name, tally) in &report.breakdown.per_difficulty {
            difficulty.add_row(vec![
                Cell::new(name),
                Cell::new(tally.correct),
                Cell::new(tally.total),
                Cell::new(format!("{:.1}%", tally.percentage(tally.total))),
            ]);
        }
        eprintln!("{difficulty}");
    }
}
