//! Mock provider and trivia source for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use triviaeval_core::model::{ResponseCode, TriviaBatch, TriviaRecord};
use triviaeval_core::traits::{GenerateRequest, GenerateResponse, LlmProvider, TriviaSource};

use crate::ProviderError;

/// A mock LLM provider for testing the evaluator without a running model.
///
/// Replies are chosen in this order: the next queued reply, a reply whose key
/// is a substring of the prompt, then the default reply.
pub struct MockProvider {
    /// Map of prompt substring → raw reply.
    responses: HashMap<String, String>,
    /// Replies consumed one per call before anything else.
    queued: Mutex<VecDeque<String>>,
    /// Default reply if nothing else matches.
    default_response: String,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→reply mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            queued: Mutex::new(VecDeque::new()),
            default_response: r#"{"answer": ""}"#.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    /// Create a mock that answers every question with `{"answer": <answer>}`
    /// for the question whose text contains the key.
    pub fn answering(answers: &[(&str, &str)]) -> Self {
        Self::new(
            answers
                .iter()
                .map(|(question, answer)| {
                    (
                        question.to_string(),
                        serde_json::json!({ "answer": answer }).to_string(),
                    )
                })
                .collect(),
        )
    }

    /// Queue replies returned, in order, before any other rule applies.
    pub fn with_queued(self, replies: &[&str]) -> Self {
        {
            let mut queued = self.queued.lock().unwrap_or_else(|e| e.into_inner());
            queued.extend(replies.iter().map(|r| r.to_string()));
        }
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = queued
            .or_else(|| {
                self.responses
                    .iter()
                    .find(|(key, _)| request.prompt.contains(key.as_str()))
                    .map(|(_, v)| v.clone())
            })
            .unwrap_or_else(|| self.default_response.clone());

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }
}

/// A mock trivia source serving pre-built batches.
///
/// Once the queue is empty every fetch reports [`ResponseCode::TokenEmpty`].
pub struct MockTriviaSource {
    batches: Mutex<VecDeque<Result<TriviaBatch, String>>>,
    fetch_count: AtomicU32,
}

impl MockTriviaSource {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(VecDeque::new()),
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Queue a successful batch.
    pub fn with_batch(self, records: Vec<TriviaRecord>) -> Self {
        self.push(Ok(TriviaBatch {
            response_code: ResponseCode::Success,
            results: records,
        }))
    }

    /// Queue an empty batch with the given response code.
    pub fn with_status(self, code: ResponseCode) -> Self {
        self.push(Ok(TriviaBatch {
            response_code: code,
            results: vec![],
        }))
    }

    /// Queue a network failure.
    pub fn with_network_error(self, message: &str) -> Self {
        self.push(Err(message.to_string()))
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    fn push(self, batch: Result<TriviaBatch, String>) -> Self {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(batch);
        self
    }
}

impl Default for MockTriviaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TriviaSource for MockTriviaSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, _amount: u32) -> anyhow::Result<TriviaBatch> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        let next = self
            .batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(message)) => Err(ProviderError::NetworkError(message).into()),
            None => Ok(TriviaBatch {
                response_code: ResponseCode::TokenEmpty,
                results: vec![],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response(r#"{"answer": "True"}"#);
        let request = GenerateRequest::json("mock", "anything".into());

        let response = provider.generate(&request).await.unwrap();
        assert_eq!(response.content, r#"{"answer": "True"}"#);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching_and_queue() {
        let provider = MockProvider::answering(&[("capital of France", "Paris")])
            .with_queued(&["not json"]);

        let request = GenerateRequest::json("mock", "What is the capital of France?".into());
        let first = provider.generate(&request).await.unwrap();
        assert_eq!(first.content, "not json");

        let second = provider.generate(&request).await.unwrap();
        assert_eq!(second.content, r#"{"answer":"Paris"}"#);

        let other = GenerateRequest::json("mock", "Unrelated".into());
        let third = provider.generate(&other).await.unwrap();
        assert_eq!(third.content, r#"{"answer": ""}"#);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn trivia_source_drains_then_reports_empty_token() {
        let source = MockTriviaSource::new()
            .with_batch(vec![])
            .with_network_error("reset");

        assert!(source.fetch(1).await.unwrap().response_code.is_success());
        assert!(source.fetch(1).await.is_err());
        assert_eq!(
            source.fetch(1).await.unwrap().response_code,
            ResponseCode::TokenEmpty
        );
        assert_eq!(source.fetch_count(), 3);
    }
}
