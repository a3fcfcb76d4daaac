//! Report request and persistence

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, StopReason};
use crate::prompts::ReportPrompt;

/// Errors from persisting a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ask the model for a Markdown report on the rendered prompt
///
/// A response without any text is treated as malformed.
pub async fn request_report(
    client: &dyn LlmClient,
    prompt: &ReportPrompt,
    config: &LlmConfig,
) -> Result<String, LlmError> {
    debug!(model = %client.model(), user_len = prompt.user.len(), "request_report: called");
    let request = CompletionRequest {
        system_prompt: prompt.system.clone(),
        messages: vec![Message::user(prompt.user.clone())],
        max_tokens: config.max_tokens,
        temperature: Some(config.temperature),
    };

    info!("Analysis in progress by the model...");
    let response = client.complete(request).await?;

    if response.stop_reason == StopReason::MaxTokens {
        warn!("Report hit the max-tokens limit and may be cut short");
    }
    info!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        cost_usd = %format!("{:.4}", response.usage.cost_usd(client.model())),
        "Model call finished"
    );

    response
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("response contained no text".to_string()))
}

/// Write the report, replacing any existing file
pub fn write_report(text: &str, path: &Path) -> Result<(), ReportError> {
    debug!(?path, len = text.len(), "write_report: called");
    std::fs::write(path, text).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Report generated successfully: {}", path.display());
    Ok(())
}
