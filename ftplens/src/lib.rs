//! ftplens - FTP log reduction and security reporting
//!
//! Shrinks an FTP server log of any size into a bounded text sample made of
//! suspicious lines with their leading context, connection events, and a
//! random sample of routine traffic. The sample is handed to a hosted model
//! that writes a Markdown incident report.
//!
//! # Modules
//!
//! - [`reduce`] - Streaming classifier, context window and budgeted accumulator
//! - [`llm`] - LLM client trait with Bedrock and Anthropic implementations
//! - [`prompts`] - Embedded and overridable report prompts
//! - [`report`] - Report request and persistence
//! - [`pipeline`] - End-to-end run
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod reduce;
pub mod report;

/// Character budget for the reduced text
pub const DEFAULT_MAX_CHARS: usize = 150_000;

/// Lines kept before each suspicious line
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Probability of sampling an ordinary line
pub const DEFAULT_SAMPLE_RATE: f64 = 0.005;

/// Where the report is written unless told otherwise
pub const DEFAULT_REPORT_PATH: &str = "report.md";

pub use config::Config;
pub use llm::{LlmClient, LlmError, create_client};
pub use pipeline::{PipelineError, RunOutcome, run};
pub use reduce::{ReduceError, ReduceStats, Reduction, reduce_file, reduce_reader};
