//! triviaeval-providers: HTTP integrations.
//!
//! Implements the `LlmProvider` trait for a local Ollama server and the
//! `TriviaSource` trait for the Open Trivia DB API, plus configuration
//! loading and in-memory mocks for tests.

pub mod config;
pub mod mock;
pub mod ollama;
pub mod opentdb;

pub use config::{create_provider, create_trivia_source, load_config, TriviaevalConfig};
pub use triviaeval_core::error::ProviderError;
