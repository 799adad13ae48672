//! Dictionary configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/stenodict/config.toml)
//! 3. Environment variables (STENODICT_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dictionary::DictionaryKind;

/// Environment variable prefix
const ENV_PREFIX: &str = "STENODICT";

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 1000;

/// Dictionary configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound on waiting for a dictionary's lock, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Open dictionaries read-only
    #[serde(default)]
    pub readonly: bool,

    /// Variant used for paths whose extension doesn't pick one
    #[serde(default)]
    pub default_kind: DictionaryKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            readonly: false,
            default_kind: DictionaryKind::default(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (STENODICT_LOCK_TIMEOUT_MS, STENODICT_READONLY)
    /// 2. Config file (~/.config/stenodict/config.toml or STENODICT_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // STENODICT_LOCK_TIMEOUT_MS
        if let Ok(val) = std::env::var(format!("{}_LOCK_TIMEOUT_MS", ENV_PREFIX)) {
            match val.trim().parse() {
                Ok(ms) => self.lock_timeout_ms = ms,
                Err(_) => warn!(value = %val, "ignoring invalid STENODICT_LOCK_TIMEOUT_MS"),
            }
        }

        // STENODICT_READONLY
        if let Ok(val) = std::env::var(format!("{}_READONLY", ENV_PREFIX)) {
            self.readonly = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Get the config file path
    ///
    /// Can be overridden with STENODICT_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stenodict")
            .join("config.toml")
    }

    /// Lock acquisition bound
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Variant to use for a dictionary file at `path`
    pub fn kind_for(&self, path: &Path) -> DictionaryKind {
        DictionaryKind::from_path(path).unwrap_or(self.default_kind)
    }
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}
