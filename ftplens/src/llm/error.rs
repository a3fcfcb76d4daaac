//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// None of these are retried: any of them ends the run.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to initialize client: {0}")]
    Init(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// True when the client could not be set up at all, as opposed to a
    /// request that was sent and failed
    pub fn is_init(&self) -> bool {
        matches!(self, LlmError::Init(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_init() {
        assert!(LlmError::Init("no token".to_string()).is_init());
        assert!(
            !LlmError::ApiError {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_init()
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err: LlmError = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err().into();
        assert!(matches!(err, LlmError::Json(_)));
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_messages() {
        let err = LlmError::ApiError {
            status: 403,
            message: "not authorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error 403: not authorized");

        let err = LlmError::Init("AWS_BEARER_TOKEN_BEDROCK not set".to_string());
        assert!(err.to_string().contains("AWS_BEARER_TOKEN_BEDROCK"));
    }
}
