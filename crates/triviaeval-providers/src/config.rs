//! Configuration loading and provider factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use triviaeval_core::collector::{CollectorConfig, DEFAULT_AMOUNT, DEFAULT_POLL_DELAY_MS};
use triviaeval_core::engine::{
    EvaluatorConfig, EvaluatorProfile, MatchMode, RetryPolicy, DEFAULT_MODEL,
    DEFAULT_REQUEST_DELAY_MS,
};
use triviaeval_core::normalize::ParseFallback;
use triviaeval_core::traits::{LlmProvider, TriviaSource};

use crate::ollama::{OllamaProvider, DEFAULT_ENDPOINT};
use crate::opentdb::{OpenTdbSource, DEFAULT_API_URL, DEFAULT_TOKEN_URL};

/// Top-level triviaeval configuration.
///
/// Note: Custom Debug impl masks the session token to keep it out of logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct TriviaevalConfig {
    /// Trivia question endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Session token sent with every question request.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Session token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Questions requested per fetch.
    #[serde(default = "default_amount")]
    pub amount: u32,
    /// Model generate endpoint.
    #[serde(default = "default_model_endpoint")]
    pub model_endpoint: String,
    /// Model name sent with every generate request.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Delay between trivia fetches in milliseconds.
    #[serde(default = "default_poll_delay")]
    pub poll_delay_ms: u64,
    /// Delay between model requests in milliseconds.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
    /// Stop evaluating after this many scored rows. Overrides the profile.
    #[serde(default)]
    pub row_cap: Option<usize>,
    /// Stop collecting after this many fetches.
    #[serde(default)]
    pub max_cycles: Option<u32>,
    /// CSV dataset path.
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    /// Evaluator behaviour switches.
    #[serde(default)]
    pub evaluator: EvaluatorSection,
}

/// The `[evaluator]` table. Unset fields fall back to the chosen profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluatorSection {
    #[serde(default)]
    pub profile: EvaluatorProfile,
    #[serde(default)]
    pub match_mode: Option<MatchMode>,
    #[serde(default)]
    pub parse_fallback: Option<ParseFallback>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl std::fmt::Debug for TriviaevalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriviaevalConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("token_url", &self.token_url)
            .field("amount", &self.amount)
            .field("model_endpoint", &self.model_endpoint)
            .field("model_name", &self.model_name)
            .field("poll_delay_ms", &self.poll_delay_ms)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("row_cap", &self.row_cap)
            .field("max_cycles", &self.max_cycles)
            .field("dataset", &self.dataset)
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}
fn default_amount() -> u32 {
    DEFAULT_AMOUNT
}
fn default_model_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_poll_delay() -> u64 {
    DEFAULT_POLL_DELAY_MS
}
fn default_request_delay() -> u64 {
    DEFAULT_REQUEST_DELAY_MS
}
fn default_dataset() -> PathBuf {
    PathBuf::from("trivia_data.csv")
}

impl Default for TriviaevalConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            token_url: default_token_url(),
            amount: default_amount(),
            model_endpoint: default_model_endpoint(),
            model_name: default_model_name(),
            poll_delay_ms: default_poll_delay(),
            request_delay_ms: default_request_delay(),
            row_cap: None,
            max_cycles: None,
            dataset: default_dataset(),
            evaluator: EvaluatorSection::default(),
        }
    }
}

impl TriviaevalConfig {
    /// Collector settings derived from this config.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            amount: self.amount,
            poll_delay_ms: self.poll_delay_ms,
            max_cycles: self.max_cycles,
        }
    }

    /// Evaluator settings: the profile's preset, overlaid with explicit options.
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        let mut config = self.evaluator.profile.config();
        config.model = self.model_name.clone();
        config.request_delay_ms = self.request_delay_ms;
        if self.row_cap.is_some() {
            config.row_cap = self.row_cap;
        }
        if let Some(mode) = self.evaluator.match_mode {
            config.match_mode = mode;
        }
        if let Some(fallback) = self.evaluator.parse_fallback {
            config.parse_fallback = fallback;
        }
        if let Some(policy) = self.evaluator.retry_policy {
            config.retry_policy = policy;
        }
        if let Some(max_attempts) = self.evaluator.max_attempts {
            config.max_attempts = max_attempts;
        }
        config
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `triviaeval.toml` in the current directory
/// 2. `~/.config/triviaeval/config.toml`
///
/// Environment variable overrides: `TRIVIAEVAL_API_TOKEN`, `TRIVIAEVAL_MODEL`.
pub fn load_config() -> Result<TriviaevalConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TriviaevalConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("triviaeval.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TriviaevalConfig::default(),
    };

    if let Ok(token) = std::env::var("TRIVIAEVAL_API_TOKEN") {
        config.api_token = Some(token);
    }
    if let Ok(model) = std::env::var("TRIVIAEVAL_MODEL") {
        config.model_name = model;
    }

    Ok(config)
}

/// Parse a TOML config and resolve `${VAR}` references in its string values.
pub fn parse_config(content: &str) -> Result<TriviaevalConfig> {
    let mut config: TriviaevalConfig = toml::from_str(content)?;
    config.api_url = resolve_env_vars(&config.api_url);
    config.token_url = resolve_env_vars(&config.token_url);
    config.model_endpoint = resolve_env_vars(&config.model_endpoint);
    config.model_name = resolve_env_vars(&config.model_name);
    config.api_token = config
        .api_token
        .as_deref()
        .map(resolve_env_vars)
        .filter(|t| !t.is_empty());
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("triviaeval"))
}

/// Create the model provider described by the config.
pub fn create_provider(config: &TriviaevalConfig) -> Result<Arc<dyn LlmProvider>> {
    Ok(Arc::new(OllamaProvider::new(&config.model_endpoint)?))
}

/// Create the Open Trivia DB client described by the config.
pub fn create_opentdb(config: &TriviaevalConfig) -> Result<OpenTdbSource> {
    Ok(OpenTdbSource::new(&config.api_url, config.api_token.clone())?
        .with_token_url(&config.token_url))
}

/// Create the trivia source described by the config.
pub fn create_trivia_source(config: &TriviaevalConfig) -> Result<Arc<dyn TriviaSource>> {
    Ok(Arc::new(create_opentdb(config)?))
}
