//! ftplens - FTP log reduction and LLM security reports
//!
//! CLI entry point.

use std::path::Path;
use std::time::Instant;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use ftplens::cli::{Cli, Command};
use ftplens::config::Config;
use ftplens::llm::create_client;
use ftplens::pipeline::{self, RunOutcome};
use ftplens::prompts::PromptLoader;
use ftplens::reduce::{ReduceStats, reduce_file};

fn setup_logging(level_str: Option<&str>) {
    // Logging isn't initialized yet, so warnings go straight to stderr
    let level = match level_str.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn print_stats(stats: &ReduceStats) {
    eprintln!(
        "{} lines read, {} selected ({} suspicious, {} connections, {} context blocks, {} samples), {} chars{}",
        stats.total_lines,
        stats.selected,
        stats.suspicious,
        stats.connections,
        stats.context_blocks,
        stats.samples,
        stats.output_chars,
        if stats.truncated { ", truncated".yellow().to_string() } else { String::new() },
    );
}

async fn cmd_run(logfile: &Path, config: &Config, seed: Option<u64>) -> Result<()> {
    debug!(?logfile, "cmd_run: called");
    let prompts = PromptLoader::new(".");
    let outcome = pipeline::run(logfile, config, make_rng(seed), &prompts, create_client)
        .await
        .context("Analysis failed")?;

    match outcome {
        RunOutcome::NothingFound { stats } => {
            print_stats(&stats);
            println!("{} No relevant data found in {}", "•".yellow(), logfile.display());
        }
        RunOutcome::Reported {
            stats,
            report,
            path,
            written,
        } => {
            print_stats(&stats);
            if written {
                println!("{} Report written to {}", "✓".green(), path.display().to_string().cyan());
            } else {
                eprintln!("{} Could not write {}, printing the report instead", "✗".red(), path.display());
                println!("{}", report);
            }
        }
    }
    Ok(())
}

fn cmd_reduce(logfile: &Path, output: Option<&Path>, config: &Config, seed: Option<u64>) -> Result<()> {
    debug!(?logfile, ?output, "cmd_reduce: called");
    let reduction = reduce_file(logfile, &config.reduce, make_rng(seed))?;

    match output {
        Some(path) => {
            std::fs::write(path, &reduction.text)
                .with_context(|| format!("Failed to write reduced log to {}", path.display()))?;
            println!("{} Reduced log written to {}", "✓".green(), path.display().to_string().cyan());
        }
        None => print!("{}", reduction.text),
    }
    print_stats(&reduction.stats);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.effective_log_level(config_log_level.as_deref()).as_deref());

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    debug!(?config, "main: configuration resolved");

    let start = Instant::now();
    match &cli.command {
        Command::Run { logfile, .. } => cmd_run(logfile, &config, cli.seed()).await?,
        Command::Reduce { logfile, output, .. } => cmd_reduce(logfile, output.as_deref(), &config, cli.seed())?,
    }
    info!("Total execution time: {:.2} seconds", start.elapsed().as_secs_f64());

    Ok(())
}
