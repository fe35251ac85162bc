use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use leadflow_core::config::AiConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured for the generative-text service")]
    MissingApiKey,
    #[error("request to generative-text service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generative-text service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("generative-text service returned no candidate text")]
    EmptyResponse,
}

/// Seam between the suggestion pipeline and whichever text-generation
/// backend is configured. Test code substitutes stubs here.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client for the generative-language API: one role-tagged prompt in,
/// the first candidate's first text part out.
pub struct GenerativeLanguageClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GenerativeLanguageClient {
    pub fn from_config(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmClient for GenerativeLanguageClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey)?;

        let request = GenerateContentRequest {
            contents: vec![Content { role: "user", parts: vec![Part { text: prompt.to_string() }] }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            error!(
                event_name = "ai.client.api_error",
                status,
                "generative-text service rejected the request"
            );
            return Err(LlmError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use leadflow_core::config::AiConfig;

    use super::{GenerativeLanguageClient, LlmClient, LlmError};

    fn config(base_url: &str, api_key: Option<&str>) -> AiConfig {
        AiConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(|key| SecretString::from(key.to_string())),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn complete_extracts_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "- Send a recap email"}]}
                }]
            })))
            .mount(&server)
            .await;

        let client = GenerativeLanguageClient::from_config(&config(&server.uri(), Some("test-key")));
        let text = client.complete("hello").await.expect("complete");
        assert_eq!(text, "- Send a recap email");
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = GenerativeLanguageClient::from_config(&config(&server.uri(), Some("test-key")));
        let error = client.complete("hello").await.expect_err("should fail");
        assert!(matches!(error, LlmError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn missing_candidate_text_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GenerativeLanguageClient::from_config(&config(&server.uri(), Some("test-key")));
        let error = client.complete("hello").await.expect_err("should fail");
        assert!(matches!(error, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = GenerativeLanguageClient::from_config(&config("http://localhost:1", None));
        let error = client.complete("hello").await.expect_err("should fail");
        assert!(matches!(error, LlmError::MissingApiKey));
    }
}
