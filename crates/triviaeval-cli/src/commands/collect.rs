//! The `triviaeval collect` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use triviaeval_core::collector::Collector;
use triviaeval_core::dataset::DatasetStore;
use triviaeval_providers::config::{create_opentdb, load_config_from};

pub struct CollectArgs {
    pub config: Option<PathBuf>,
    pub dataset: Option<PathBuf>,
    pub poll_delay_ms: Option<u64>,
    pub amount: Option<u32>,
    pub max_cycles: Option<u32>,
    pub token: Option<String>,
}

pub async fn execute(args: CollectArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;

    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }
    if let Some(delay) = args.poll_delay_ms {
        config.poll_delay_ms = delay;
    }
    if let Some(amount) = args.amount {
        config.amount = amount;
    }
    if args.max_cycles.is_some() {
        config.max_cycles = args.max_cycles;
    }
    if args.token.is_some() {
        config.api_token = args.token;
    }

    anyhow::ensure!(
        (1..=50).contains(&config.amount),
        "amount must be between 1 and 50"
    );

    if config.api_token.is_none() {
        tracing::warn!(
            "no session token configured; the API may serve duplicate questions \
             (run `triviaeval token` to get one)"
        );
    }

    let source = Arc::new(create_opentdb(&config)?);
    let store = DatasetStore::new(&config.dataset);
    let collector = Collector::new(source, store, config.collector_config());

    eprintln!(
        "Collecting {} question(s) every {}ms into {}",
        config.amount,
        config.poll_delay_ms,
        config.dataset.display()
    );

    let summary = collector.run().await?;

    eprintln!(
        "\nStopped after {} fetch(es): {}. {} row(s) appended to {}",
        summary.cycles,
        summary.stop_reason,
        summary.appended,
        config.dataset.display()
    );

    Ok(())
}
