//! RON configuration file plus environment and command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sendoc_engine::{ChatSettings, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "sendoc.ron";
pub const BASE_URL_ENV: &str = "SENDOC_BASE_URL";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a job search assistant. Keep answers concise. \
When relevant, include nearby alternatives and return a 'jobs' array.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub max_body_bytes: u64,
    pub system_prompt: String,
    /// Where the session file lives.
    pub data_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = ChatSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            request_timeout_secs: None,
            max_body_bytes: engine.max_body_bytes,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            data_dir: PathBuf::from(".sendoc"),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Loads `explicit` (which must exist) or, failing that, the default file
    /// if present; otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `--base-url`, or the environment variable clap reads for it.
    pub fn apply_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn chat_settings(&self, session_id: String) -> ChatSettings {
        ChatSettings {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            session_id,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            max_body_bytes: self.max_body_bytes,
        }
    }
}
