//! Line classification
//!
//! Decides whether a log line is worth keeping: suspicious lines carry a
//! failure or privileged-account keyword, connection lines mark a session
//! start or a successful login.

use tracing::debug;

/// Default suspicious keywords, matched case-insensitively as substrings
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "FAIL",
    "error",
    "denied",
    "refused",
    "incorrect",
    "530",
    "550",
    "421",
    "root",
    "admin",
];

/// Fixed connection markers (already lowercase)
pub const CONNECTION_MARKERS: &[&str] = &["connect", "ok login"];

/// Classification of a single log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Matches at least one suspicious keyword
    Suspicious,
    /// Matches a connection marker but no suspicious keyword
    Connection,
    /// Neither
    Ordinary,
}

/// Keyword-based line classifier
///
/// Keywords are case-folded once at construction, so classifying a line only
/// folds the line itself.
#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: Vec<String>,
}

impl Classifier {
    /// Build a classifier from a keyword list
    ///
    /// Empty strings are dropped since they would match every line. An empty
    /// list (after dropping) falls back to [`DEFAULT_KEYWORDS`].
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        debug!(keyword_count = keywords.len(), "Classifier::new: called");
        let folded: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if folded.is_empty() {
            debug!("Classifier::new: no usable keywords, using defaults");
            return Self::default();
        }

        Self { keywords: folded }
    }

    /// The folded keyword set in use
    #[cfg(test)]
    fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Classify one line. Suspicious takes priority over Connection.
    pub fn classify(&self, line: &str) -> LineClass {
        if line.is_empty() {
            return LineClass::Ordinary;
        }

        let folded = line.to_lowercase();
        if self.keywords.iter().any(|k| folded.contains(k.as_str())) {
            LineClass::Suspicious
        } else if CONNECTION_MARKERS.iter().any(|m| folded.contains(m)) {
            LineClass::Connection
        } else {
            LineClass::Ordinary
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}
