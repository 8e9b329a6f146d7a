//! Gemini response generation.
//!
//! # API Reference
//!
//! - Endpoint: `POST {api_url}/v1beta/models/{model}:generateContent?key={api_key}`
//! - Structured style: persona in `systemInstruction`, history in `contents`
//!   with roles `user` / `model`
//! - Concatenated style: one `contents` entry holding the flattened prompt

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::messages::{Content, GeminiErrorResponse, GenerateContentRequest, GenerateContentResponse};
use crate::core::llm::base::{LlmError, LlmResult, ResponseGenerator};
use crate::core::llm::prompt::{PromptStyle, build_concatenated_prompt};
use crate::core::session::{Role, Turn};

/// Gemini REST base URL
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub prompt_style: PromptStyle,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    fn generate_url(&self) -> LlmResult<Url> {
        let raw = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid Gemini URL: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: GEMINI_API_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            prompt_style: PromptStyle::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> LlmResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationFailed(
                "Gemini API key is required".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Request body for `persona` and `context` in the configured style.
    pub fn build_request(&self, persona: &str, context: &[Turn]) -> GenerateContentRequest {
        match self.config.prompt_style {
            PromptStyle::Structured => GenerateContentRequest {
                system_instruction: Some(Content::text(None, persona)),
                contents: context
                    .iter()
                    .map(|turn| {
                        let role = match turn.role() {
                            Role::User => "user",
                            Role::Agent => "model",
                        };
                        Content::text(Some(role), turn.text())
                    })
                    .collect(),
            },
            PromptStyle::Concatenated => GenerateContentRequest {
                system_instruction: None,
                contents: vec![Content::text(
                    Some("user"),
                    build_concatenated_prompt(persona, context),
                )],
            },
        }
    }
}

#[async_trait]
impl ResponseGenerator for GeminiClient {
    async fn generate(&self, persona: &str, context: &[Turn]) -> LlmResult<String> {
        if context.is_empty() {
            return Err(LlmError::ConfigurationError(
                "No conversation turns to respond to".to_string(),
            ));
        }

        let body = self.build_request(persona, context);
        debug!(
            model = %self.config.model,
            turns = context.len(),
            style = ?self.config.prompt_style,
            "Sending Gemini request"
        );

        let response = self
            .http_client
            .post(self.config.generate_url()?)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let error_msg = match serde_json::from_str::<GeminiErrorResponse>(&response_text) {
                Ok(parsed) => format!(
                    "Gemini API error: {} ({})",
                    parsed.error.message, parsed.error.status
                ),
                Err(_) => format!("Gemini API error ({status}): {response_text}"),
            };
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed(error_msg),
                _ => LlmError::ProviderError(error_msg),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::ProviderError(format!("Failed to parse response: {e}")))?;
        let text = parsed.first_text().ok_or(LlmError::EmptyResponse)?;

        info!(model = %self.config.model, chars = text.len(), "Gemini response generated");
        Ok(text)
    }

    fn provider_info(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, style: PromptStyle) -> GeminiClient {
        let config = GeminiConfig {
            api_url: server.uri(),
            prompt_style: style,
            ..GeminiConfig::new("gm-key")
        };
        GeminiClient::new(config).expect("Should create client")
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            GeminiClient::new(GeminiConfig::default()),
            Err(LlmError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_structured_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "gm-key"))
            .and(body_json(json!({
                "systemInstruction": {"parts": [{"text": "You are terse."}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "hello"}]},
                    {"role": "model", "parts": [{"text": "hi"}]},
                    {"role": "user", "parts": [{"text": "how are you"}]}
                ]
            })))
            .respond_with(reply("fine"))
            .expect(1)
            .mount(&server)
            .await;

        let context = vec![
            Turn::new(Role::User, "hello"),
            Turn::new(Role::Agent, "hi"),
            Turn::new(Role::User, "how are you"),
        ];
        let text = client_for(&server, PromptStyle::Structured)
            .generate("You are terse.", &context)
            .await
            .expect("Should generate");
        assert_eq!(text, "fine");
    }

    #[tokio::test]
    async fn test_concatenated_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "P\n\nUser: hello"}]}]
            })))
            .respond_with(reply("hi there"))
            .expect(1)
            .mount(&server)
            .await;

        let context = vec![Turn::new(Role::User, "hello")];
        let text = client_for(&server, PromptStyle::Concatenated)
            .generate("P", &context)
            .await
            .expect("Should generate");
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, PromptStyle::Structured)
            .generate("P", &[Turn::new(Role::User, "hello")])
            .await
            .expect_err("Should fail");
        assert!(matches!(err, LlmError::ProviderError(ref m) if m.contains("Resource exhausted")));
    }

    #[tokio::test]
    async fn test_missing_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, PromptStyle::Structured)
            .generate("P", &[Turn::new(Role::User, "hello")])
            .await
            .expect_err("Should fail");
        assert!(matches!(err, LlmError::EmptyResponse));
    }
}
