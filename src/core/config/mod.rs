//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitlane has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITLANE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitlane/config.toml`
//! 3. `~/.gitlane/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `.git/gitlane/config.toml` inside the working copy.
//!
//! # Example
//!
//! ```no_run
//! use gitlane::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("History limit: {}", config.history_limit());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, GraphConfig, IdentityConfig, RepoConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::graph::LayoutMetrics;

/// Default number of commits loaded by history views.
pub const DEFAULT_HISTORY_LIMIT: i64 = 500;

/// Default remote for fetch/pull/push.
pub const DEFAULT_REMOTE: &str = "origin";

/// Keys understood by [`Config::get`] and the `set_key` methods.
pub const KEYS: &[&str] = &[
    "remote",
    "history_limit",
    "ssh_key",
    "identity.name",
    "identity.email",
    "graph.row_height",
    "graph.lane_width",
];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("'{0}' can only be set in the global config")]
    GlobalOnly(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence automatically: repo config overrides
/// global config, which overrides defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo and present)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_path` is the root of a working copy, also loads its repo
    /// config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(repo_path: Option<&Path>) -> Result<Self, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), repo_path)
    }

    /// Load with an explicit global config file.
    pub fn load_from(global_file: Option<&Path>, repo_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = match global_file {
            Some(path) if path.exists() => (read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf())),
            _ => (GlobalConfig::default(), None),
        };

        let (repo, repo_path) = match repo_path.map(Self::repo_config_path) {
            Some(path) if path.exists() => {
                let repo = read_toml::<RepoConfig>(&path)?;
                (Some(repo), Some(path))
            }
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        tracing::debug!(
            global = ?global_path,
            repo = ?repo_path,
            "loaded configuration"
        );

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GITLANE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitlane/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".gitlane/config.toml");
        path.exists().then_some(path)
    }

    /// Get the canonical path for global config.
    ///
    /// `$GITLANE_CONFIG` when set, otherwise `~/.gitlane/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("GITLANE_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gitlane/config.toml"))
    }

    /// `.git/gitlane/config.toml` relative to the given working copy.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(".git/gitlane/config.toml")
    }

    /// Write global config atomically.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::global_config_path()?;
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    /// Write repo config atomically.
    pub fn write_repo(repo_path: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::repo_config_path(repo_path);
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Remote used by fetch/pull/push. Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .or(self.global.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Commits loaded by history views; 0 means all.
    pub fn history_limit(&self) -> i64 {
        self.repo
            .as_ref()
            .and_then(|r| r.history_limit)
            .or(self.global.history_limit)
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    /// Explicitly configured SSH private key.
    pub fn ssh_key(&self) -> Option<&Path> {
        self.global.ssh_key.as_deref()
    }

    /// Fallback identity, only when both name and email are set.
    pub fn identity(&self) -> Option<(&str, &str)> {
        let identity = self.global.identity.as_ref()?;
        Some((identity.name.as_deref()?, identity.email.as_deref()?))
    }

    /// Graph metrics with configured overrides applied.
    pub fn layout_metrics(&self) -> LayoutMetrics {
        let mut metrics = LayoutMetrics::default();
        if let Some(graph) = &self.global.graph {
            if let Some(h) = graph.row_height {
                metrics.row_height = h;
            }
            if let Some(w) = graph.lane_width {
                metrics.lane_width = w;
            }
        }
        metrics
    }

    /// Effective value of a key, rendered as text.
    ///
    /// Returns `Ok(None)` for known keys that are unset and have no default.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "remote" => Some(self.remote().to_string()),
            "history_limit" => Some(self.history_limit().to_string()),
            "ssh_key" => self.ssh_key().map(|p| p.display().to_string()),
            "identity.name" => self.global.identity.as_ref().and_then(|i| i.name.clone()),
            "identity.email" => self.global.identity.as_ref().and_then(|i| i.email.clone()),
            "graph.row_height" => Some(self.layout_metrics().row_height.to_string()),
            "graph.lane_width" => Some(self.layout_metrics().lane_width.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

impl GlobalConfig {
    /// Set a key from its text form.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "remote" => self.remote = Some(value.to_string()),
            "history_limit" => self.history_limit = Some(parse_value(key, value)?),
            "ssh_key" => self.ssh_key = Some(PathBuf::from(value)),
            "identity.name" => {
                self.identity.get_or_insert_with(Default::default).name = Some(value.to_string())
            }
            "identity.email" => {
                self.identity.get_or_insert_with(Default::default).email = Some(value.to_string())
            }
            "graph.row_height" => {
                self.graph.get_or_insert_with(Default::default).row_height =
                    Some(parse_value(key, value)?)
            }
            "graph.lane_width" => {
                self.graph.get_or_insert_with(Default::default).lane_width =
                    Some(parse_value(key, value)?)
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }
}

impl RepoConfig {
    /// Set a key from its text form.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "remote" => self.remote = Some(value.to_string()),
            "history_limit" => self.history_limit = Some(parse_value(key, value)?),
            k if KEYS.contains(&k) => return Err(ConfigError::GlobalOnly(k.to_string())),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{key}: cannot parse '{value}'")))
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write to a temp file in the same directory, then rename over the target.
fn write_toml_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let write_err = |e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
