//! Client configuration, stored as JSON in `.apitester/config.json` under
//! the working directory. Environment variables override the file:
//!
//! - `APITESTER_API_URL` — backend base URL
//! - `APITESTER_TIMEOUT_MS` — request timeout, `0` disables it
//! - `APITESTER_TOKEN` — bearer token sent with every request

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATA_DIR: &str = ".apitester";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub api_url: String,
    pub timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            token: None,
        }
    }
}

impl Config {
    /// Loads `.apitester/config.json` from the working directory and applies
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_dir(&data_dir())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads the config file in `dir`; a missing file yields the defaults.
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let file = dir.join(CONFIG_FILE);
        if !file.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&file).map_err(|source| ConfigError::Io {
            path: file.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: file, source })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        self.save_to(&data_dir())
    }

    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ConfigError> {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = dir.join(CONFIG_FILE);
        let raw = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: file.clone(),
            source,
        })?;
        fs::write(&file, raw).map_err(|source| ConfigError::Io {
            path: file.clone(),
            source,
        })?;
        Ok(file)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = var("APITESTER_API_URL") {
            self.api_url = url;
        }
        if let Some(timeout) = var("APITESTER_TIMEOUT_MS") {
            self.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("APITESTER_TIMEOUT_MS is not a number: `{timeout}`")))?;
        }
        if let Some(token) = var("APITESTER_TOKEN") {
            let token = token.trim().to_string();
            self.token = (!token.is_empty()).then_some(token);
        }
        Ok(())
    }
}

fn data_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DATA_DIR)
}
