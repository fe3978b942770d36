//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$GITLANE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitlane/config.toml`
//! 3. `~/.gitlane/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.git/gitlane/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing (remote names non-empty, graph
//! metrics positive, identity email plausible).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// history_limit = 500
/// ssh_key = "/home/me/.ssh/id_work"
///
/// [identity]
/// name = "Jo Doe"
/// email = "jo@example.com"
///
/// [graph]
/// row_height = 24.0
/// lane_width = 14.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Remote used by fetch/pull/push (default: "origin")
    pub remote: Option<String>,

    /// Commits loaded by history views; 0 loads everything
    pub history_limit: Option<i64>,

    /// Private key used for SSH remotes
    pub ssh_key: Option<PathBuf>,

    /// Fallback commit identity when git config has none
    pub identity: Option<IdentityConfig>,

    /// Commit graph geometry
    pub graph: Option<GraphConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_remote(self.remote.as_deref())?;
        validate_history_limit(self.history_limit)?;

        if let Some(identity) = &self.identity {
            identity.validate()?;
        }
        if let Some(graph) = &self.graph {
            graph.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// remote = "upstream"
/// history_limit = 0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote name, overrides the global setting
    pub remote: Option<String>,

    /// History limit, overrides the global setting
    pub history_limit: Option<i64>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_remote(self.remote.as_deref())?;
        validate_history_limit(self.history_limit)
    }
}

/// Commit identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "identity.name cannot be empty".to_string(),
                ));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue(format!(
                    "identity.email '{}' is not an email address",
                    email
                )));
            }
        }
        Ok(())
    }
}

/// Commit graph geometry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub row_height: Option<f32>,
    pub lane_width: Option<f32>,
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("row_height", self.row_height), ("lane_width", self.lane_width)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ConfigError::InvalidValue(format!(
                        "graph.{} must be a positive number, got {}",
                        key, v
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_remote(remote: Option<&str>) -> Result<(), ConfigError> {
    match remote {
        Some(r) if r.trim().is_empty() => Err(ConfigError::InvalidValue(
            "remote cannot be empty".to_string(),
        )),
        Some(r) if r.contains(char::is_whitespace) || r.contains('/') => Err(
            ConfigError::InvalidValue(format!("invalid remote name '{}'", r)),
        ),
        _ => Ok(()),
    }
}

fn validate_history_limit(limit: Option<i64>) -> Result<(), ConfigError> {
    match limit {
        Some(n) if n < 0 => Err(ConfigError::InvalidValue(format!(
            "history_limit cannot be negative, got {}",
            n
        ))),
        _ => Ok(()),
    }
}
