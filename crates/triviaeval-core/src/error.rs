//! Error types.
//!
//! `ProviderError` covers failures talking to the trivia API or the model
//! endpoint. It is defined here rather than in `triviaeval-providers` so the
//! collector and evaluator can downcast and classify errors without string
//! matching. `DatasetError` covers the CSV store, and is the only error that
//! aborts a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when interacting with a remote API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The API answered, but not in the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and retrying the same request is pointless.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ProviderError::ModelNotFound(_))
    }
}

/// Errors raised by the CSV dataset store.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to access dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in dataset {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to encode incorrect answers: {0}")]
    Serialize(#[from] serde_json::Error),
}
