//! End-to-end run: reduce, ask for a report, write it

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::{Config, LlmConfig};
use crate::llm::{LlmClient, LlmError};
use crate::prompts::PromptLoader;
use crate::reduce::{ReduceError, ReduceStats, reduce_file};
use crate::report::{request_report, write_report};

/// Fatal errors of a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// How a successful run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The reduced text was empty; the model was never called
    NothingFound { stats: ReduceStats },
    /// A report was produced
    Reported {
        stats: ReduceStats,
        report: String,
        path: PathBuf,
        /// False when the report could not be written; the run still succeeds
        written: bool,
    },
}

/// Run the full analysis of one log file
///
/// The client is built through `make_client` only once there is something to
/// send, so a run that finds nothing needs no credentials.
pub async fn run<R, F>(
    log_path: &Path,
    config: &Config,
    rng: R,
    prompts: &PromptLoader,
    make_client: F,
) -> Result<RunOutcome, PipelineError>
where
    R: Rng,
    F: FnOnce(&LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError>,
{
    debug!(?log_path, "run: called");
    let reduction = reduce_file(log_path, &config.reduce, rng)?;

    if reduction.is_empty() {
        warn!("No relevant data identified, nothing to analyze");
        return Ok(RunOutcome::NothingFound {
            stats: reduction.stats,
        });
    }

    let client = make_client(&config.llm)?;
    let prompt = prompts
        .report_prompt(&reduction.text)
        .map_err(|e| PipelineError::Prompt(e.to_string()))?;
    let report = request_report(client.as_ref(), &prompt, &config.llm).await?;

    let path = config.report.output.clone();
    let written = match write_report(&report, &path) {
        Ok(()) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    };

    Ok(RunOutcome::Reported {
        stats: reduction.stats,
        report,
        path,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReduceConfig;
    use crate::llm::client::mock::MockLlmClient;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config {
            reduce: ReduceConfig {
                sample_rate: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        config.report.output = dir.join("report.md");
        config
    }

    #[tokio::test]
    async fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("vsftpd.log");
        std::fs::write(
            &log,
            "[pid 1] CONNECT: Client \"10.0.0.5\"\n[pid 2] [root] FAIL LOGIN: Client \"10.0.0.5\"\n",
        )
        .unwrap();
        let config = config_in(dir.path());
        let mock = Arc::new(MockLlmClient::with_text("# Report\n"));
        let client: Arc<dyn LlmClient> = mock.clone();

        let outcome = run(
            &log,
            &config,
            StdRng::seed_from_u64(7),
            &PromptLoader::embedded_only(),
            |_| Ok(client),
        )
        .await
        .unwrap();

        match outcome {
            RunOutcome::Reported { stats, written, path, .. } => {
                assert!(written);
                assert_eq!(stats.suspicious, 1);
                assert_eq!(std::fs::read_to_string(path).unwrap(), "# Report\n");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(mock.call_count(), 1);
        let user = &mock.requests()[0].messages[0].content;
        assert!(user.contains("[root] FAIL LOGIN"));
        assert!(user.contains("<logs>"));
    }

    #[tokio::test]
    async fn test_nothing_found_skips_client() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("quiet.log");
        std::fs::write(&log, "OK DOWNLOAD /pub/a\nOK DOWNLOAD /pub/b\n").unwrap();
        let config = config_in(dir.path());

        let outcome = run(
            &log,
            &config,
            StdRng::seed_from_u64(7),
            &PromptLoader::embedded_only(),
            |_| -> Result<Arc<dyn LlmClient>, LlmError> { panic!("client must not be created") },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::NothingFound { .. }));
        assert!(!config.report.output.exists());
    }

    #[tokio::test]
    async fn test_missing_log_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = run(
            &dir.path().join("absent.log"),
            &config,
            StdRng::seed_from_u64(7),
            &PromptLoader::embedded_only(),
            |_| -> Result<Arc<dyn LlmClient>, LlmError> { panic!("client must not be created") },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Reduce(ReduceError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_client_init_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("vsftpd.log");
        std::fs::write(&log, "530 Login incorrect\n").unwrap();
        let config = config_in(dir.path());

        let err = run(
            &log,
            &config,
            StdRng::seed_from_u64(7),
            &PromptLoader::embedded_only(),
            |_| Err(LlmError::Init("no credentials".to_string())),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Llm(LlmError::Init(_))));
    }

    #[tokio::test]
    async fn test_request_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("vsftpd.log");
        std::fs::write(&log, "530 Login incorrect\n").unwrap();
        let config = config_in(dir.path());
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new(vec![]));

        let err = run(
            &log,
            &config,
            StdRng::seed_from_u64(7),
            &PromptLoader::embedded_only(),
            |_| Ok(client),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Llm(LlmError::InvalidResponse(_))));
        assert!(!config.report.output.exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("vsftpd.log");
        std::fs::write(&log, "550 Permission denied\n").unwrap();
        let mut config = config_in(dir.path());
        config.report.output = dir.path().join("no-such-dir").join("report.md");
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::with_text("# Report"));

        let outcome = run(
            &log,
            &config,
            StdRng::seed_from_u64(7),
            &PromptLoader::embedded_only(),
            |_| Ok(client),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Reported { written: false, .. }));
    }
}
