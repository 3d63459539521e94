//! The `triviaeval validate` command.

use std::path::PathBuf;

use anyhow::Result;

use triviaeval_core::dataset::{validate_records, DatasetStore};
use triviaeval_core::model::QuestionType;

pub fn execute(dataset_path: PathBuf) -> Result<()> {
    let dataset = DatasetStore::new(&dataset_path).load()?;

    let count = |kind: QuestionType| dataset.records.iter().filter(|r| r.kind == kind).count();
    println!(
        "Dataset: {} ({} questions: {} multiple, {} boolean)",
        dataset_path.display(),
        dataset.records.len(),
        count(QuestionType::Multiple),
        count(QuestionType::Boolean),
    );

    for row in &dataset.rejected {
        println!("  [line {}] ERROR: {}", row.line, row.reason);
    }

    let warnings = validate_records(&dataset.records);
    for w in &warnings {
        println!("  [question {}] WARNING: {}", w.index + 1, w.message);
    }

    if dataset.rejected.is_empty() && warnings.is_empty() {
        println!("Dataset valid.");
    } else {
        println!(
            "\n{} unreadable row(s), {} warning(s) found.",
            dataset.rejected.len(),
            warnings.len()
        );
    }

    Ok(())
}
