//! Open Trivia DB question source.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::instrument;

use triviaeval_core::model::{ResponseCode, TriviaBatch};
use triviaeval_core::traits::TriviaSource;

use crate::ProviderError;

pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";
pub const DEFAULT_TOKEN_URL: &str = "https://opentdb.com/api_token.php";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the Open Trivia DB question and session-token endpoints.
pub struct OpenTdbSource {
    api_url: String,
    token_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl OpenTdbSource {
    pub fn new(api_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_url: api_url.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    pub fn with_token_url(mut self, token_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self
    }

    /// Ask the API for a fresh session token.
    ///
    /// A session token makes the API avoid repeating questions until every
    /// question has been served (response code 4).
    pub async fn request_token(&self) -> anyhow::Result<String> {
        let url = Url::parse_with_params(&self.token_url, [("command", "request")])
            .with_context(|| format!("invalid token URL: {}", self.token_url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("token response: {e}")))?;

        match body.token {
            Some(token) if body.response_code.is_success() => Ok(token),
            _ => Err(ProviderError::ApiError {
                status,
                message: format!(
                    "token request refused with response code {}: {}",
                    body.response_code,
                    body.response_message.unwrap_or_default()
                ),
            }
            .into()),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    response_code: ResponseCode,
    #[serde(default)]
    response_message: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[async_trait]
impl TriviaSource for OpenTdbSource {
    fn name(&self) -> &str {
        "opentdb"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, amount: u32) -> anyhow::Result<TriviaBatch> {
        let amount = amount.to_string();
        let mut params = vec![("amount", amount.as_str())];
        if let Some(token) = &self.token {
            params.push(("token", token.as_str()));
        }
        let url = Url::parse_with_params(&self.api_url, &params)
            .with_context(|| format!("invalid API URL: {}", self.api_url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let batch: TriviaBatch = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("trivia response: {e}")))?;

        tracing::debug!(
            "response code {}, {} question(s)",
            batch.response_code,
            batch.results.len()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triviaeval_core::model::QuestionType;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_passes_amount_and_token() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "response_code": 0,
            "results": [{
                "type": "boolean",
                "difficulty": "easy",
                "category": "Science: Computers",
                "question": "The logo for Snapchat is a Bell.",
                "correct_answer": "False",
                "incorrect_answers": ["True"]
            }]
        });

        Mock::given(method("GET"))
            .and(path("/api.php"))
            .and(query_param("amount", "1"))
            .and(query_param("token", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            OpenTdbSource::new(&format!("{}/api.php", server.uri()), Some("abc123".into()))
                .unwrap();
        let batch = source.fetch(1).await.unwrap();
        assert!(batch.response_code.is_success());
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].kind, QuestionType::Boolean);
        assert_eq!(batch.results[0].correct_answer, "False");
    }

    #[tokio::test]
    async fn failure_code_has_no_results() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response_code": 4, "results": []})),
            )
            .mount(&server)
            .await;

        let source = OpenTdbSource::new(&format!("{}/api.php", server.uri()), None).unwrap();
        let batch = source.fetch(1).await.unwrap();
        assert_eq!(batch.response_code, ResponseCode::TokenEmpty);
        assert!(batch.results.is_empty());
    }

    #[tokio::test]
    async fn unexpected_shape_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api.php"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"questions": []})),
            )
            .mount(&server)
            .await;

        let source = OpenTdbSource::new(&format!("{}/api.php", server.uri()), None).unwrap();
        let err = source.fetch(1).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn request_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api_token.php"))
            .and(query_param("command", "request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response_code": 0,
                "response_message": "Token Generated Successfully!",
                "token": "f00dcafe"
            })))
            .mount(&server)
            .await;

        let source = OpenTdbSource::new(&format!("{}/api.php", server.uri()), None)
            .unwrap()
            .with_token_url(&format!("{}/api_token.php", server.uri()));
        assert_eq!(source.request_token().await.unwrap(), "f00dcafe");
    }
}
