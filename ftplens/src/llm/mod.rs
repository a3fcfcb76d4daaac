//! LLM client module
//!
//! Sends the reduced log to an inference provider and hands back the text it
//! generates. Requests are single round trips with no retries.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
mod bedrock;
pub mod client;
mod error;
mod types;

pub use anthropic::AnthropicClient;
pub use bedrock::{BEDROCK_ANTHROPIC_VERSION, BedrockClient};
pub use client::LlmClient;
pub use error::LlmError;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;
use types::MessagesResponse;

/// Create an LLM client based on the provider specified in config
///
/// Supports "bedrock" and "anthropic" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "bedrock" => Ok(Arc::new(BedrockClient::from_config(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Init(format!(
                "Unknown LLM provider: '{}'. Supported: bedrock, anthropic",
                other
            )))
        }
    }
}

/// Turn an HTTP response carrying a Messages API body into a completion
///
/// 429 maps to [`LlmError::RateLimited`], any other non-success status to
/// [`LlmError::ApiError`].
pub(crate) async fn read_messages_response(response: reqwest::Response) -> Result<CompletionResponse, LlmError> {
    let status = response.status().as_u16();
    debug!(%status, "read_messages_response: called");

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        return Err(LlmError::RateLimited {
            retry_after: std::time::Duration::from_secs(retry_after),
        });
    }

    if !response.status().is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError { status, message: text });
    }

    let bytes = response.bytes().await?;
    parse_messages_body(&bytes)
}

/// Decode a Messages API body; a body that is not JSON of that shape is an
/// [`LlmError::Json`]
fn parse_messages_body(bytes: &[u8]) -> Result<CompletionResponse, LlmError> {
    debug!(len = bytes.len(), "parse_messages_body: called");
    let api_response: MessagesResponse = serde_json::from_slice(bytes)?;
    Ok(api_response.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_init_error() {
        let config = LlmConfig {
            provider: "watsonx".to_string(),
            ..Default::default()
        };

        let err = create_client(&config).err().unwrap();
        assert!(err.is_init());
        assert!(err.to_string().contains("watsonx"));
    }

    #[test]
    fn test_parse_messages_body() {
        let body = br##"{"content":[{"type":"text","text":"# Report"}],"stop_reason":"max_tokens"}"##;

        let response = parse_messages_body(body).unwrap();
        assert_eq!(response.content.as_deref(), Some("# Report"));
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }

    #[test]
    fn test_malformed_body_is_json_error() {
        let err = parse_messages_body(b"<html>502 Bad Gateway</html>").err().unwrap();
        assert!(matches!(err, LlmError::Json(_)));

        // Valid JSON without a content array
        let err = parse_messages_body(br#"{"type":"error"}"#).err().unwrap();
        assert!(matches!(err, LlmError::Json(_)));
    }
}
