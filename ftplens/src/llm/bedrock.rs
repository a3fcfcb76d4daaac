//! Amazon Bedrock client for Anthropic models
//!
//! Calls the runtime `invoke` endpoint with an Anthropic Messages body and
//! authenticates with a Bedrock API key (bearer token).

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, read_messages_response};
use crate::config::LlmConfig;

/// `anthropic_version` value Bedrock expects in the request body
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Bedrock runtime client
pub struct BedrockClient {
    model: String,
    api_key: String,
    endpoint: String,
    http: Client,
    max_tokens: u32,
}

impl BedrockClient {
    /// Create a new client from configuration
    ///
    /// Reads the bearer token from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, region = %config.region, "BedrockClient::from_config: called");
        info!("Initializing Bedrock client (region: {}, model: {})", config.region, config.model);

        let api_key = config.get_api_key().map_err(|e| LlmError::Init(e.to_string()))?;

        if config.region.trim().is_empty() {
            return Err(LlmError::Init("region must not be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::Init(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: Self::endpoint_for(config),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Runtime endpoint: the configured override, else the regional default
    fn endpoint_for(config: &LlmConfig) -> String {
        config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", config.region))
            .trim_end_matches('/')
            .to_string()
    }

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.endpoint, self.model)
    }

    /// Build the request body for the invoke endpoint
    ///
    /// The model travels in the URL, not the body.
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut body = serde_json::json!({
            "anthropic_version": BEDROCK_ANTHROPIC_VERSION,
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
impl LlmClient for BedrockClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.invoke_url();
        debug!(%url, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
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
