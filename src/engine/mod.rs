//! engine
//!
//! The request surface a front end calls: one method per user action.
//!
//! # Architecture
//!
//! Every request follows the same shape:
//!
//! ```text
//! acquire repo lock -> open repository -> git reads/writes -> core transforms -> result
//! ```
//!
//! The lock is taken before the repository is opened and released when the
//! request returns, so requests against one working copy observe each other
//! in lock-acquisition order. Requests against different paths never wait
//! for each other.
//!
//! # Invariants
//!
//! - No request touches a repository without holding its [`RepoGuard`]
//! - Long-running requests report through a [`ProgressSink`]
//! - Configuration is reloaded per request, so edits apply immediately
//!
//! # Example
//!
//! ```ignore
//! use gitlane::engine::{Engine, NullSink};
//! use std::path::Path;
//!
//! let engine = Engine::new();
//! let repo = Path::new("/path/to/repo");
//! engine.stage_file(repo, "README.md")?;
//! engine.commit(repo, "Update README", "", false, &NullSink)?;
//! ```
//!
//! [`RepoGuard`]: crate::core::ops::RepoGuard

pub mod progress;
pub mod worker;

mod log;
mod refs;
mod summary;
mod sync;
mod worktree;

pub use progress::{NullSink, Progress, ProgressSink};
pub use refs::{RemoteBranches, TagPush};
pub use summary::RepoSummary;
pub use worker::AsyncEngine;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::{Config, ConfigError};
use crate::core::ops::LockRegistry;
use crate::core::types::TypeError;
use crate::git::{Git, GitError};

/// Errors from engine requests.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Git error.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A name or hash argument was malformed.
    #[error(transparent)]
    InvalidArgument(#[from] TypeError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A background worker panicked or was cancelled.
    #[error("worker failed: {message}")]
    Worker { message: String },
}

impl EngineError {
    /// Whether the path simply is not a repository yet.
    pub fn is_not_a_repo(&self) -> bool {
        matches!(self, EngineError::Git(GitError::NotARepo { .. }))
    }
}

/// The request surface.
///
/// Cheap to clone; clones share one lock registry.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<LockRegistry>,
    global_config: Option<PathBuf>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with its own lock registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(LockRegistry::new()))
    }

    /// An engine sharing `registry` with other engines.
    pub fn with_registry(registry: Arc<LockRegistry>) -> Self {
        Self {
            registry,
            global_config: None,
        }
    }

    /// Read global configuration from `path` instead of the default
    /// locations.
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config = Some(path.into());
        self
    }

    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    /// Effective configuration for the working copy at `path`.
    pub fn config(&self, path: &Path) -> Result<Config, EngineError> {
        let config = match &self.global_config {
            Some(file) => Config::load_from(Some(file), Some(path))?,
            None => Config::load(Some(path))?,
        };
        Ok(config)
    }

    /// Run `f` against the repository at `path` while holding its lock.
    fn with_repo<T>(
        &self,
        path: &Path,
        request: &'static str,
        f: impl FnOnce(&Git) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _guard = self.registry.acquire(path);
        tracing::debug!(path = %path.display(), request, "handling request");
        let git = Git::open(path)?;
        f(&git)
    }

    /// [`Engine::with_repo`] for requests that need the repository mutably.
    fn with_repo_mut<T>(
        &self,
        path: &Path,
        request: &'static str,
        f: impl FnOnce(&mut Git) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _guard = self.registry.acquire(path);
        tracing::debug!(path = %path.display(), request, "handling request");
        let mut git = Git::open(path)?;
        f(&mut git)
    }

    // =========================================================================
    // Repository lifecycle
    // =========================================================================

    /// Create an empty repository at `path`.
    pub fn init(&self, path: &Path) -> Result<(), EngineError> {
        let _guard = self.registry.acquire(path);
        Git::init(path)?;
        tracing::info!(path = %path.display(), "initialized repository");
        Ok(())
    }

    /// Whether `path` is the root of a working copy.
    ///
    /// A missing repository is `Ok(false)`, not an error.
    pub fn is_repo(&self, path: &Path) -> Result<bool, EngineError> {
        let _guard = self.registry.acquire(path);
        Ok(Git::is_repo(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_missing_repo_is_distinguished() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::new();

        let err = engine.status(temp.path()).unwrap_err();
        assert!(err.is_not_a_repo());
        assert!(!engine.is_repo(temp.path()).unwrap());
    }

    #[test]
    fn init_then_is_repo() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::new();

        engine.init(temp.path()).unwrap();
        assert!(engine.is_repo(temp.path()).unwrap());
        assert!(engine.status(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn clones_share_registry() {
        let engine = Engine::new();
        let other = engine.clone();
        assert!(Arc::ptr_eq(engine.registry(), other.registry()));
    }

    #[test]
    fn repo_lock_released_after_request() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::new();
        engine.init(temp.path()).unwrap();

        engine.status(temp.path()).unwrap();
        assert!(!engine.registry().is_locked(temp.path()));
    }
}
