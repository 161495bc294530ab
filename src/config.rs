//! Project configuration.
//!
//! Reads an optional TOML file at `.forgeplan/config.toml` and resolves every
//! setting through the chain: CLI flag > env var > config file > default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{CommentStyle, CommentStyleRegistry};
use crate::ports::filesystem::FileSystem;
use crate::prompts;
use crate::session::{self, AssistantSettings};

/// Name of the config file inside the state directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Overrides the model.
pub const ENV_MODEL: &str = "FORGEPLAN_MODEL";
/// Overrides the context window.
pub const ENV_CONTEXT_WINDOW: &str = "FORGEPLAN_CONTEXT_WINDOW";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Model identifier.
    pub model: Option<String>,
    /// Cap on generated tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Context window in tokens.
    pub context_window: Option<usize>,
    /// Extra attempts after a retryable LLM failure.
    pub max_retries: Option<u32>,
    /// Delay before the first retry, in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Additional documentation comment styles keyed by extension.
    pub comment_styles: BTreeMap<String, CommentStyle>,
}

/// Path of the config file for the project at `root`.
#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    session::state_dir(root).join(CONFIG_FILE)
}

/// Loads the config file, or the empty config when there is none.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_config(fs: &dyn FileSystem, root: &Path) -> Result<ConfigFile, String> {
    let path = config_path(root);
    if !fs.exists(&path) {
        return Ok(ConfigFile::default());
    }
    let contents = fs
        .read_to_string(&path)
        .map_err(|e| format!("failed to read config file at {}: {e}", path.display()))?;
    toml::from_str(&contents).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Settings that come from the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// `--model`.
    pub model: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM exchange settings.
    pub assistant: AssistantSettings,
    /// Built-in plus configured comment styles.
    pub comment_styles: CommentStyleRegistry,
}

impl Config {
    /// Resolves configuration for the project at `root`.
    ///
    /// `env` looks up environment variables; production passes
    /// `|k| std::env::var(k).ok()`.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file is unreadable or invalid, or an
    /// environment override cannot be parsed.
    pub fn resolve<E>(
        fs: &dyn FileSystem,
        root: &Path,
        cli: &CliOverrides,
        env: E,
    ) -> Result<Self, String>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = load_config(fs, root)?;
        let defaults = AssistantSettings::default();

        let model = cli
            .model
            .clone()
            .or_else(|| env(ENV_MODEL).filter(|m| !m.trim().is_empty()))
            .or(file.model)
            .unwrap_or(defaults.model);

        let context_window = match env(ENV_CONTEXT_WINDOW) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                format!("{ENV_CONTEXT_WINDOW} must be a positive integer, got {raw:?}: {e}")
            })?,
            None => file.context_window.unwrap_or(defaults.context_window),
        };

        let assistant = AssistantSettings {
            model,
            max_tokens: file.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: file.temperature.unwrap_or(defaults.temperature),
            context_window,
            max_retries: file.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff: file
                .retry_backoff_ms
                .map_or(defaults.retry_backoff, Duration::from_millis),
            system: Some(prompts::SYSTEM.to_string()),
        };
        let empty = |style: &CommentStyle| style.start.is_empty() || style.end.is_empty();
        if let Some((ext, _)) = file.comment_styles.iter().find(|(_, style)| empty(style)) {
            return Err(format!(
                "comment style {ext:?} in {} needs a non-empty start and end",
                config_path(root).display()
            ));
        }
        let comment_styles = CommentStyleRegistry::builtin().with_styles(file.comment_styles);

        Ok(Self { assistant, comment_styles })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
