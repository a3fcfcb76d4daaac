//! Log reduction
//!
//! Single pass over an FTP server log that keeps only what is worth showing
//! an analyst: suspicious lines with the few lines leading up to them,
//! connection events, and a thin random sample of everything else. The output
//! stays within a character budget no matter how large the input is.
//!
//! Memory is bounded by the context window and the record list, which the
//! accumulator purges down to a fixed head and tail once it grows too large.

mod accumulator;
mod classify;
mod context;
mod error;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::Rng;
use tracing::{debug, info};

pub use accumulator::{
    Accumulator, BudgetPolicy, Finished, SAMPLE_TAG, SelectionRecord, TRUNCATED_END, TRUNCATED_MIDDLE,
};
pub use classify::{CONNECTION_MARKERS, Classifier, DEFAULT_KEYWORDS, LineClass};
pub use context::{CONTEXT_HEADER, ContextBuffer};
pub use error::ReduceError;

use crate::config::ReduceConfig;

/// One line of input and its 0-based position in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub seq: usize,
    /// Line text, terminator included when present
    pub text: String,
}

impl LogLine {
    pub fn new(seq: usize, text: String) -> Self {
        Self { seq, text }
    }
}

/// Counters for one reduction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub total_lines: usize,
    /// Alert and sample lines kept (context blocks not counted)
    pub selected: usize,
    pub suspicious: usize,
    pub connections: usize,
    pub context_blocks: usize,
    pub samples: usize,
    pub purges: usize,
    /// Whether the final character cut was applied
    pub truncated: bool,
    /// Length of the reduced text in characters
    pub output_chars: usize,
}

/// Result of a reduction pass
#[derive(Debug, Clone)]
pub struct Reduction {
    pub text: String,
    pub stats: ReduceStats,
}

impl Reduction {
    /// True when nothing but whitespace was kept
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Streaming reducer, fed one line at a time
///
/// The sampling source is injected so runs can be made reproducible.
pub struct Reducer<R: Rng> {
    classifier: Classifier,
    context: ContextBuffer,
    acc: Accumulator,
    rng: R,
    sample_rate: f64,
    stats: ReduceStats,
}

impl<R: Rng> Reducer<R> {
    pub fn new(config: &ReduceConfig, rng: R) -> Self {
        debug!(
            max_chars = config.max_chars,
            context_lines = config.context_lines,
            sample_rate = config.sample_rate,
            "Reducer::new: called"
        );
        let sample_rate = if config.sample_rate.is_finite() {
            config.sample_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            classifier: Classifier::new(&config.keywords),
            context: ContextBuffer::new(config.context_lines),
            acc: Accumulator::new(config.budget()),
            rng,
            sample_rate,
            stats: ReduceStats::default(),
        }
    }

    /// Process the next line of the stream
    pub fn feed(&mut self, text: String) {
        let seq = self.stats.total_lines;
        self.stats.total_lines += 1;

        let class = self.classifier.classify(&text);
        self.context.push(LogLine::new(seq, text.clone()));

        match class {
            LineClass::Suspicious => {
                if let Some(block) = self.context.flush_context() {
                    self.acc.push(SelectionRecord::context(seq, block));
                    self.stats.context_blocks += 1;
                }
                self.acc.push(SelectionRecord::alert(seq, text));
                self.stats.suspicious += 1;
                self.stats.selected += 1;
            }
            LineClass::Connection => {
                self.acc.push(SelectionRecord::alert(seq, text));
                self.stats.connections += 1;
                self.stats.selected += 1;
            }
            LineClass::Ordinary => {
                if self.rng.random::<f64>() < self.sample_rate {
                    self.acc.push(SelectionRecord::sample(seq, &text));
                    self.stats.samples += 1;
                    self.stats.selected += 1;
                }
            }
        }

        self.acc.check_budget();
    }

    /// Lines of context currently held
    pub fn context_len(&self) -> usize {
        self.context.len()
    }

    /// Serialize what was kept and apply the final budget cut
    pub fn finish(self) -> Reduction {
        let mut stats = self.stats;
        stats.purges = self.acc.purges();

        let Finished { text, truncated } = self.acc.finish();
        stats.truncated = truncated;
        stats.output_chars = text.chars().count();

        info!(
            "Analysis complete: {} lines read, {} segments selected",
            stats.total_lines, stats.selected
        );
        debug!(?stats, "Reducer::finish: done");
        Reduction { text, stats }
    }
}

/// Reduce a buffered stream
///
/// Lines keep their `\n` terminator, with a `\r\n` ending folded to `\n`.
/// Invalid UTF-8 is replaced rather than rejected, so binary junk in a log
/// never aborts the pass.
pub fn reduce_reader<B: BufRead, R: Rng>(
    mut reader: B,
    source: &Path,
    config: &ReduceConfig,
    rng: R,
) -> Result<Reduction, ReduceError> {
    debug!(?source, "reduce_reader: called");
    let mut reducer = Reducer::new(config, rng);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).map_err(|source_err| ReduceError::Read {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        if n == 0 {
            break;
        }
        if buf.ends_with(b"\r\n") {
            buf.remove(buf.len() - 2);
        }
        reducer.feed(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(reducer.finish())
}

/// Reduce the log file at `path`
pub fn reduce_file<P: AsRef<Path>, R: Rng>(path: P, config: &ReduceConfig, rng: R) -> Result<Reduction, ReduceError> {
    let path = path.as_ref();
    debug!(?path, "reduce_file: called");

    if !path.exists() {
        return Err(ReduceError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Analyzing file: {}", path.display());
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReduceError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => ReduceError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    reduce_reader(BufReader::new(file), path, config, rng)
}
