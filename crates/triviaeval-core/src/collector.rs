//! The polling collector.
//!
//! Fetches batches from a [`TriviaSource`] on a fixed interval and appends
//! them to the dataset until the source stops delivering.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetStore;
use crate::model::ResponseCode;
use crate::throttle::Throttle;
use crate::traits::TriviaSource;

pub const DEFAULT_POLL_DELAY_MS: u64 = 10_000;
pub const DEFAULT_AMOUNT: u32 = 1;

/// Configuration for the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Questions requested per fetch.
    pub amount: u32,
    /// Minimum interval between fetches.
    pub poll_delay_ms: u64,
    /// Stop after this many fetches (None = until the source runs dry).
    pub max_cycles: Option<u32>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT,
            poll_delay_ms: DEFAULT_POLL_DELAY_MS,
            max_cycles: None,
        }
    }
}

/// Why the collector stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// The API answered with a non-success response code.
    ApiStatus { code: ResponseCode },
    /// The API succeeded but returned no questions.
    EmptyResults,
    /// The request failed or the response could not be decoded.
    Fetch { error: String },
    /// `max_cycles` fetches were made.
    CycleLimit,
}

impl StopReason {
    /// Whether the source ran out of data (as opposed to hitting the cycle limit).
    pub fn is_no_more_data(&self) -> bool {
        !matches!(self, StopReason::CycleLimit)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ApiStatus { code } => write!(f, "API response code {code}"),
            StopReason::EmptyResults => write!(f, "API returned no questions"),
            StopReason::Fetch { error } => write!(f, "fetch failed: {error}"),
            StopReason::CycleLimit => write!(f, "cycle limit reached"),
        }
    }
}

/// What a collector run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectSummary {
    /// Fetches attempted.
    pub cycles: u32,
    /// Rows appended to the dataset.
    pub appended: usize,
    pub stop_reason: StopReason,
}

/// Polls a trivia source and appends to a dataset.
pub struct Collector {
    source: Arc<dyn TriviaSource>,
    store: DatasetStore,
    config: CollectorConfig,
    throttle: Throttle,
}

impl Collector {
    pub fn new(source: Arc<dyn TriviaSource>, store: DatasetStore, config: CollectorConfig) -> Self {
        let throttle = Throttle::from_millis(config.poll_delay_ms);
        Self {
            source,
            store,
            config,
            throttle,
        }
    }

    /// Poll until the source stops delivering.
    ///
    /// Fetch failures end the run normally; only dataset write errors are
    /// returned as `Err`.
    pub async fn run(&self) -> Result<CollectSummary> {
        let mut cycles = 0u32;
        let mut appended = 0usize;

        let stop_reason = loop {
            if self.config.max_cycles.is_some_and(|max| cycles >= max) {
                break StopReason::CycleLimit;
            }

            self.throttle.wait().await;
            cycles += 1;
            tracing::info!("fetching trivia data from {} (cycle {cycles})", self.source.name());

            let batch = match self.source.fetch(self.config.amount).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::error!("error fetching data from the API: {e:#}");
                    break StopReason::Fetch {
                        error: format!("{e:#}"),
                    };
                }
            };

            if !batch.response_code.is_success() {
                tracing::error!(
                    "failed to fetch trivia data, response code {}",
                    batch.response_code
                );
                break StopReason::ApiStatus {
                    code: batch.response_code,
                };
            }

            if batch.results.is_empty() {
                tracing::info!("no trivia data fetched");
                break StopReason::EmptyResults;
            }

            let written = self.store.append(&batch.results)?;
            appended += written;
            tracing::info!(
                "appended {written} record(s) to {}",
                self.store.path().display()
            );
        };

        tracing::info!("collector stopped after {cycles} cycle(s): {stop_reason}");
        Ok(CollectSummary {
            cycles,
            appended,
            stop_reason,
        })
    }
}
