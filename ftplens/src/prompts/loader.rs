//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults, then renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Override directory, relative to the working directory
const OVERRIDE_DIR: &str = ".ftplens/prompts";

/// Variables available to the report template
#[derive(Debug, Clone, Serialize)]
struct ReportContext<'a> {
    logs: &'a str,
}

/// Rendered system and user prompts for one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPrompt {
    pub system: String,
    pub user: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `base`, picking up `.ftplens/prompts/` if present
    pub fn new(base: impl AsRef<Path>) -> Self {
        let user_dir = base.as_ref().join(OVERRIDE_DIR);
        let exists = user_dir.is_dir();
        debug!(?user_dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: exists.then_some(user_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    /// Log text must reach the model verbatim, so HTML escaping is off
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name: user override first, then embedded
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render the system and user prompts around the reduced log
    pub fn report_prompt(&self, logs: &str) -> Result<ReportPrompt> {
        debug!(logs_len = logs.len(), "PromptLoader::report_prompt: called");
        let system = self.load_template("system")?.trim_end().to_string();
        let template = self.load_template("report")?;

        let user = self
            .hbs
            .render_template(&template, &ReportContext { logs })
            .map_err(|e| eyre!("Failed to render template report: {}", e))?;

        Ok(ReportPrompt { system, user })
    }
}
