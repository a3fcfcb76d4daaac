//! CLI argument parsing for ftplens

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, LlmConfig, ReduceConfig};

/// ftplens - FTP log reduction and LLM security reports
#[derive(Parser, Debug)]
#[command(name = "ftplens")]
#[command(author, version, about = "Reduce FTP server logs and get an LLM security report", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Verbose output (same as --log-level DEBUG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reduce a log file and write an LLM security report
    Run {
        /// FTP server log file
        #[arg(required = true)]
        logfile: PathBuf,

        /// Report output path (default: report.md)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        reduce: ReduceArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Only reduce a log file and print what would be sent
    Reduce {
        /// FTP server log file
        #[arg(required = true)]
        logfile: PathBuf,

        /// Write the reduced text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        reduce: ReduceArgs,
    },
}

/// Reduction overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ReduceArgs {
    /// Character budget for the text sent to the model (default: 150000)
    #[arg(long = "max-size")]
    pub max_size: Option<usize>,

    /// Lines of context before each alert (default: 3)
    #[arg(long)]
    pub context: Option<usize>,

    /// Suspicious keywords, replacing the defaults
    #[arg(long, num_args = 1..)]
    pub keywords: Option<Vec<String>>,

    /// Probability of sampling an ordinary line (default: 0.005)
    #[arg(long = "sample-rate")]
    pub sample_rate: Option<f64>,

    /// Seed for line sampling, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ReduceArgs {
    /// Apply the flags that were given on top of the loaded config
    pub fn apply(&self, config: &mut ReduceConfig) {
        debug!(?self, "ReduceArgs::apply: called");
        if let Some(max_size) = self.max_size {
            config.max_chars = max_size;
        }
        if let Some(context) = self.context {
            config.context_lines = context;
        }
        if let Some(ref keywords) = self.keywords {
            config.keywords = keywords.clone();
        }
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
    }
}

/// Inference overrides
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// Cloud region (default: us-west-2)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Inference provider: bedrock or anthropic (default: bedrock)
    #[arg(long)]
    pub provider: Option<String>,
}

impl LlmArgs {
    /// Apply the flags that were given on top of the loaded config
    pub fn apply(&self, config: &mut LlmConfig) {
        debug!(?self, "LlmArgs::apply: called");
        if let Some(ref region) = self.region {
            config.region = region.clone();
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(ref provider) = self.provider {
            config.provider = provider.clone();
        }
    }
}

impl Cli {
    /// Log level to start with: --verbose, then --log-level, then config
    pub fn effective_log_level(&self, config_log_level: Option<&str>) -> Option<String> {
        if self.verbose {
            return Some("DEBUG".to_string());
        }
        self.log_level.clone().or_else(|| config_log_level.map(str::to_string))
    }

    /// Fold every override from the command line into `config`
    pub fn apply(&self, config: &mut Config) {
        match &self.command {
            Command::Run {
                output, reduce, llm, ..
            } => {
                reduce.apply(&mut config.reduce);
                llm.apply(&mut config.llm);
                if let Some(output) = output {
                    config.report.output = output.clone();
                }
            }
            Command::Reduce { reduce, .. } => reduce.apply(&mut config.reduce),
        }
    }

    /// Sampling seed, if one was given
    pub fn seed(&self) -> Option<u64> {
        match &self.command {
            Command::Run { reduce, .. } | Command::Reduce { reduce, .. } => reduce.seed,
        }
    }
}
