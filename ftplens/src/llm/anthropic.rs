//! Anthropic Claude API client implementation
//!
//! Talks to the Messages API directly, for setups without Bedrock access.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, read_messages_response};
use crate::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Claude API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable specified in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "AnthropicClient::from_config: called");
        info!("Initializing Anthropic client (model: {})", config.model);

        let api_key = config.get_api_key().map_err(|e| LlmError::Init(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::Init(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "system": request.system_prompt,
            "messages": request.messages,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        read_messages_response(response).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;
    use serial_test::serial;

    #[test]
    fn test_build_request_body_basic() {
        let client = AnthropicClient {
            model: "claude-sonnet-4".to_string(),
            api_key: "test-key".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
            max_tokens: 8192,
        };

        let request = CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Hello")],
            max_tokens: 1000,
            temperature: Some(0.0),
        };

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "claude-sonnet-4");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["system"], "You are helpful");
        assert_eq!(body["temperature"], 0.0);
        assert!(body["messages"].is_array());
        assert!(body.get("anthropic_version").is_none());
    }

    #[test]
    #[serial]
    fn test_base_url_override_is_trimmed() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            api_key_env: "FTPLENS_TEST_ANTHROPIC_KEY_PRESENT".to_string(),
            base_url: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        };
        // SAFETY: env-mutating tests are serialized
        unsafe { std::env::set_var("FTPLENS_TEST_ANTHROPIC_KEY_PRESENT", "k") };

        let client = AnthropicClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.model(), config.model);
    }
}
