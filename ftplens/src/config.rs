//! ftplens configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reduce::{BudgetPolicy, DEFAULT_KEYWORDS};

/// Main ftplens configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Inference provider configuration
    pub llm: LlmConfig,

    /// Log reduction parameters
    pub reduce: ReduceConfig,

    /// Report output configuration
    pub report: ReportConfig,
}

impl Config {
    /// Check value ranges before use
    ///
    /// Credentials are checked later, when the client is created, so that a
    /// run that finds nothing interesting never needs them.
    pub fn validate(&self) -> Result<()> {
        self.reduce.validate()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .ftplens.yml
        let local_config = PathBuf::from(".ftplens.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/ftplens/ftplens.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ftplens").join("ftplens.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load later reports them.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Inference provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("bedrock" or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Cloud region, used by the bedrock provider
    pub region: String,

    /// Environment variable containing the API key or bearer token
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Endpoint override; the provider default is used when unset
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "bedrock".to_string(),
            model: "anthropic.claude-3-sonnet-20240229-v1:0".to_string(),
            region: "us-west-2".to_string(),
            api_key_env: "AWS_BEARER_TOKEN_BEDROCK".to_string(),
            base_url: None,
            max_tokens: 4096,
            temperature: 0.0,
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| eyre::eyre!("API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

/// Log reduction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceConfig {
    /// Character budget for the reduced text
    #[serde(rename = "max-chars")]
    pub max_chars: usize,

    /// Lines of context kept before each suspicious line
    #[serde(rename = "context-lines")]
    pub context_lines: usize,

    /// Probability of keeping an ordinary line as a sample
    #[serde(rename = "sample-rate")]
    pub sample_rate: f64,

    /// Suspicious keywords (case-insensitive substrings)
    pub keywords: Vec<String>,

    /// Mid-stream purge triggers above `max-chars * soft-limit-ratio`
    #[serde(rename = "soft-limit-ratio")]
    pub soft_limit_ratio: f64,

    /// Mid-stream purge also needs more records than this
    #[serde(rename = "purge-min-records")]
    pub purge_min_records: usize,

    /// Records kept from the start on purge
    #[serde(rename = "purge-head")]
    pub purge_head: usize,

    /// Records kept from the end on purge
    #[serde(rename = "purge-tail")]
    pub purge_tail: usize,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        let policy = BudgetPolicy::default();
        Self {
            max_chars: policy.max_chars,
            context_lines: crate::DEFAULT_CONTEXT_LINES,
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            soft_limit_ratio: policy.soft_limit_ratio,
            purge_min_records: policy.purge_min_records,
            purge_head: policy.purge_head,
            purge_tail: policy.purge_tail,
        }
    }
}

impl ReduceConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(eyre::eyre!("sample-rate must be between 0 and 1, got {}", self.sample_rate));
        }
        if self.soft_limit_ratio.is_nan() || self.soft_limit_ratio < 1.0 {
            return Err(eyre::eyre!(
                "soft-limit-ratio must be at least 1, got {}",
                self.soft_limit_ratio
            ));
        }
        match self.purge_head.checked_add(self.purge_tail) {
            Some(kept) if kept <= self.purge_min_records => {}
            _ => {
                return Err(eyre::eyre!(
                    "purge-head ({}) + purge-tail ({}) must not exceed purge-min-records ({})",
                    self.purge_head,
                    self.purge_tail,
                    self.purge_min_records
                ));
            }
        }
        Ok(())
    }

    /// Budget limits for the accumulator
    pub fn budget(&self) -> BudgetPolicy {
        BudgetPolicy {
            max_chars: self.max_chars,
            soft_limit_ratio: self.soft_limit_ratio,
            purge_min_records: self.purge_min_records,
            purge_head: self.purge_head,
            purge_tail: self.purge_tail,
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Where the Markdown report is written
    pub output: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(crate::DEFAULT_REPORT_PATH),
        }
    }
}
