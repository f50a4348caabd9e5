// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection configuration
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! unique_name = ":1.42"
//! max_rule_len = 1024
//! max_subscriptions = 256
//!
//! [logging]
//! filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest match rule the bus accepts
pub const DEFAULT_MAX_RULE_LEN: usize = 1024;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Unique bus name of the local connection
    pub unique_name: Option<String>,
    pub max_rule_len: usize,
    /// Per-connection subscription cap; unset means unlimited
    pub max_subscriptions: Option<usize>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            unique_name: None,
            max_rule_len: DEFAULT_MAX_RULE_LEN,
            max_subscriptions: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl BusConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BusConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rule_len == 0 {
            return Err(ConfigError::Invalid(
                "max_rule_len must be greater than zero".to_string(),
            ));
        }
        if self.max_subscriptions == Some(0) {
            return Err(ConfigError::Invalid(
                "max_subscriptions must be greater than zero".to_string(),
            ));
        }
        if self.unique_name.as_deref() == Some("") {
            return Err(ConfigError::Invalid(
                "unique_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
