#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! Values come from [`ReorderConfig::default`], a JSON file, or the
//! environment. Environment parsing takes an injectable lookup so tests
//! never touch the process environment.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `REORDER_HANDLE_PREFIX` | Prefix stripped from handle element ids |
//! | `REORDER_COMMIT_TIMEOUT_MS` | Commit timeout in milliseconds; `0` disables |
//! | `REORDER_WORKER_NAME` | Name of the commit worker thread |

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reorder_core::HandlePrefix;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the handle prefix.
pub const ENV_HANDLE_PREFIX: &str = "REORDER_HANDLE_PREFIX";
/// Environment variable setting the commit timeout in milliseconds.
pub const ENV_COMMIT_TIMEOUT_MS: &str = "REORDER_COMMIT_TIMEOUT_MS";
/// Environment variable naming the commit worker thread.
pub const ENV_WORKER_NAME: &str = "REORDER_WORKER_NAME";

const DEFAULT_WORKER_NAME: &str = "reorder-commit";

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid JSON for [`ReorderConfig`].
    Parse(String),
    /// An environment variable holds an unusable value.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(_) | Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Settings for a [`crate::ReorderSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Prefix carried by handle element ids.
    pub handle_prefix: HandlePrefix,
    /// Give up on a commit after this many milliseconds. `None` waits forever.
    pub commit_timeout_ms: Option<u64>,
    /// Name of the commit worker thread.
    pub worker_name: String,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            handle_prefix: HandlePrefix::default(),
            commit_timeout_ms: None,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

impl ReorderConfig {
    #[must_use]
    pub fn with_handle_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.handle_prefix = HandlePrefix::new(prefix);
        self
    }

    #[must_use]
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.commit_timeout_ms = (ms > 0).then_some(ms);
        self
    }

    #[must_use]
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// The configured commit timeout, if any.
    #[must_use]
    pub fn commit_timeout(&self) -> Option<Duration> {
        self.commit_timeout_ms.map(Duration::from_millis)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom environment lookup.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().merge_env(get_env)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON file, then apply overrides from the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load a JSON file, then apply overrides through a custom lookup.
    pub fn load_with<F>(path: &Path, get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)?.merge_env(get_env)
    }

    /// Apply environment overrides on top of `self`.
    pub fn merge_env<F>(mut self, get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = get_env(ENV_HANDLE_PREFIX) {
            self.handle_prefix = HandlePrefix::new(prefix);
        }
        if let Some(raw) = get_env(ENV_COMMIT_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_COMMIT_TIMEOUT_MS.to_string(),
                value: raw.clone(),
            })?;
            self.commit_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(name) = get_env(ENV_WORKER_NAME) {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_WORKER_NAME.to_string(),
                    value: name.to_string(),
                });
            }
            self.worker_name = name.to_string();
        }
        Ok(self)
    }
}
