//! Run configuration
//!
//! Layered as defaults → optional TOML file → environment variables. The
//! resulting [`Config`] is passed explicitly to the clients and orchestrator.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_API_URL: &str = "BASKET_METRICS_API_URL";
pub const ENV_API_KEY: &str = "BASKET_METRICS_API_KEY";
pub const ENV_CANDIDATE_ID: &str = "BASKET_METRICS_CANDIDATE_ID";
pub const ENV_VALUE_PRECISION: &str = "BASKET_METRICS_VALUE_PRECISION";

const DEFAULT_VALUE_PRECISION: i64 = 8;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub candidate_id: String,
    /// Fractional digits kept in the output payload; validated by `PrecisionPolicy`
    pub value_precision: i64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            candidate_id: String::new(),
            value_precision: DEFAULT_VALUE_PRECISION,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Shape of `config.toml`; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    candidate_id: Option<String>,
    value_precision: Option<i64>,
    request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load from `path` if given, else from the default config location when
    /// it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        if let Some(file) = file {
            debug!("Reading configuration from {}", file.display());
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read config file {}", file.display()))?;
            config
                .merge_toml(&content)
                .with_context(|| format!("Invalid config file {}", file.display()))?;
        }

        config.merge_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn merge_toml(&mut self, content: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(content)?;
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.api_key {
            self.api_key = v;
        }
        if let Some(v) = file.candidate_id {
            self.candidate_id = v;
        }
        if let Some(v) = file.value_precision {
            self.value_precision = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        Ok(())
    }

    fn merge_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_API_URL) {
            self.api_url = v;
        }
        if let Some(v) = non_empty(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Some(v) = non_empty(ENV_CANDIDATE_ID) {
            self.candidate_id = v;
        }
        if let Some(v) = non_empty(ENV_VALUE_PRECISION) {
            self.value_precision = v
                .trim()
                .parse()
                .with_context(|| {
                    format!("{} must be an integer, got '{}'", ENV_VALUE_PRECISION, v)
                })?;
        }
        Ok(())
    }

    /// Fail early when the remote API is needed but not configured
    pub fn require_api(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            anyhow::bail!(
                "API URL is not configured (set {} or api_url in config.toml)",
                ENV_API_URL
            );
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/basket-metrics/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)
        .map(|dir| dir.join("basket-metrics").join("config.toml"))
}
