//! engine::worker
//!
//! Async facade over [`Engine`] for front ends running on tokio.
//!
//! # Architecture
//!
//! Engine requests block: they wait on the repository lock and on disk and
//! network I/O. [`AsyncEngine`] moves each request onto tokio's blocking
//! pool with `spawn_blocking`, so requests for different repositories run
//! side by side while the runtime's async threads stay free. Requests for
//! the same repository still queue on its lock.
//!
//! Progress of long-running requests is forwarded over an unbounded
//! channel; see [`progress_channel`].
//!
//! # Example
//!
//! ```ignore
//! use gitlane::engine::worker::{progress_channel, AsyncEngine};
//!
//! let engine = AsyncEngine::default();
//! let (tx, mut rx) = progress_channel();
//! let fetch = tokio::spawn({
//!     let engine = engine.clone();
//!     async move { engine.fetch(repo, tx).await }
//! });
//! while let Some(event) = rx.recv().await {
//!     println!("{} {}%", event.status, event.percent);
//! }
//! fetch.await??;
//! ```

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::{Engine, EngineError, Progress, RemoteBranches, RepoSummary, TagPush};
use crate::core::branch_tree::BranchTree;
use crate::core::graph::GraphLayout;
use crate::core::history::CommitRecord;
use crate::core::types::Oid;
use crate::git::{BranchInfo, CommitChange, PullOutcome, StashEntry, StatusEntry, TagInfo};

/// Channel pair for streaming [`Progress`] out of a request.
///
/// The request drops its sender when it returns, which ends the stream.
pub fn progress_channel() -> (UnboundedSender<Progress>, UnboundedReceiver<Progress>) {
    unbounded_channel()
}

/// [`Engine`] whose requests run on tokio's blocking pool.
#[derive(Debug, Clone, Default)]
pub struct AsyncEngine {
    engine: Engine,
}

impl From<Engine> for AsyncEngine {
    fn from(engine: Engine) -> Self {
        Self { engine }
    }
}

impl AsyncEngine {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// The wrapped blocking engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run a blocking request against `path` on the blocking pool.
    pub async fn run<T, F>(&self, path: impl AsRef<Path>, request: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&Engine, &Path) -> Result<T, EngineError> + Send + 'static,
    {
        let engine = self.engine.clone();
        let path: PathBuf = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || request(&engine, &path))
            .await
            .map_err(|e| EngineError::Worker {
                message: e.to_string(),
            })?
    }

    pub async fn init(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.run(path, |e, p| e.init(p)).await
    }

    pub async fn is_repo(&self, path: impl AsRef<Path>) -> Result<bool, EngineError> {
        self.run(path, |e, p| e.is_repo(p)).await
    }

    pub async fn status(&self, path: impl AsRef<Path>) -> Result<Vec<StatusEntry>, EngineError> {
        self.run(path, |e, p| e.status(p)).await
    }

    pub async fn stage_file(&self, path: impl AsRef<Path>, file: &str) -> Result<(), EngineError> {
        let file = file.to_string();
        self.run(path, move |e, p| e.stage_file(p, &file)).await
    }

    pub async fn unstage_file(&self, path: impl AsRef<Path>, file: &str) -> Result<(), EngineError> {
        let file = file.to_string();
        self.run(path, move |e, p| e.unstage_file(p, &file)).await
    }

    pub async fn stage_all(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.run(path, |e, p| e.stage_all(p)).await
    }

    pub async fn unstage_all(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.run(path, |e, p| e.unstage_all(p)).await
    }

    pub async fn file_diff(
        &self,
        path: impl AsRef<Path>,
        file: &str,
        staged: bool,
    ) -> Result<String, EngineError> {
        let file = file.to_string();
        self.run(path, move |e, p| e.file_diff(p, &file, staged)).await
    }

    pub async fn commit(
        &self,
        path: impl AsRef<Path>,
        subject: &str,
        body: &str,
        amend: bool,
        progress: UnboundedSender<Progress>,
    ) -> Result<Oid, EngineError> {
        let (subject, body) = (subject.to_string(), body.to_string());
        self.run(path, move |e, p| e.commit(p, &subject, &body, amend, &progress))
            .await
    }

    pub async fn discard_changes(
        &self,
        path: impl AsRef<Path>,
        files: Vec<String>,
    ) -> Result<(), EngineError> {
        self.run(path, move |e, p| e.discard_changes(p, &files)).await
    }

    pub async fn stash_save(
        &self,
        path: impl AsRef<Path>,
        files: Vec<String>,
        message: Option<&str>,
    ) -> Result<Option<Oid>, EngineError> {
        let message = message.map(String::from);
        self.run(path, move |e, p| e.stash_save(p, &files, message.as_deref()))
            .await
    }

    pub async fn stashes(&self, path: impl AsRef<Path>) -> Result<Vec<StashEntry>, EngineError> {
        self.run(path, |e, p| e.stashes(p)).await
    }

    pub async fn stash_drop(&self, path: impl AsRef<Path>, index: usize) -> Result<(), EngineError> {
        self.run(path, move |e, p| e.stash_drop(p, index)).await
    }

    pub async fn stash_pop(&self, path: impl AsRef<Path>, index: usize) -> Result<(), EngineError> {
        self.run(path, move |e, p| e.stash_pop(p, index)).await
    }

    pub async fn history(
        &self,
        path: impl AsRef<Path>,
        count: i64,
    ) -> Result<Vec<CommitRecord>, EngineError> {
        self.run(path, move |e, p| e.history(p, count)).await
    }

    pub async fn history_graph(
        &self,
        path: impl AsRef<Path>,
        count: i64,
    ) -> Result<(Vec<CommitRecord>, GraphLayout), EngineError> {
        self.run(path, move |e, p| e.history_graph(p, count)).await
    }

    pub async fn commit_changes(
        &self,
        path: impl AsRef<Path>,
        hash: &str,
    ) -> Result<Vec<CommitChange>, EngineError> {
        let hash = hash.to_string();
        self.run(path, move |e, p| e.commit_changes(p, &hash)).await
    }

    pub async fn commit_file_diff(
        &self,
        path: impl AsRef<Path>,
        hash: &str,
        file: &str,
    ) -> Result<String, EngineError> {
        let (hash, file) = (hash.to_string(), file.to_string());
        self.run(path, move |e, p| e.commit_file_diff(p, &hash, &file))
            .await
    }

    pub async fn branches(&self, path: impl AsRef<Path>) -> Result<Vec<BranchInfo>, EngineError> {
        self.run(path, |e, p| e.branches(p)).await
    }

    pub async fn remote_branches(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<RemoteBranches>, EngineError> {
        self.run(path, |e, p| e.remote_branches(p)).await
    }

    pub async fn tags(&self, path: impl AsRef<Path>) -> Result<Vec<TagInfo>, EngineError> {
        self.run(path, |e, p| e.tags(p)).await
    }

    pub async fn branch_tree(&self, path: impl AsRef<Path>) -> Result<BranchTree, EngineError> {
        self.run(path, |e, p| e.branch_tree(p)).await
    }

    pub async fn checkout(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        is_remote: bool,
    ) -> Result<(), EngineError> {
        let name = name.to_string();
        self.run(path, move |e, p| e.checkout(p, &name, is_remote)).await
    }

    pub async fn create_branch(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        start_point: Option<&str>,
        checkout: bool,
    ) -> Result<Oid, EngineError> {
        let name = name.to_string();
        let start_point = start_point.map(String::from);
        self.run(path, move |e, p| {
            e.create_branch(p, &name, start_point.as_deref(), checkout)
        })
        .await
    }

    pub async fn delete_branch(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        delete_remote: bool,
        progress: UnboundedSender<Progress>,
    ) -> Result<(), EngineError> {
        let name = name.to_string();
        self.run(path, move |e, p| e.delete_branch(p, &name, delete_remote, &progress))
            .await
    }

    pub async fn create_tag(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        message: Option<&str>,
        target: Option<&str>,
        push: TagPush,
        progress: UnboundedSender<Progress>,
    ) -> Result<Oid, EngineError> {
        let name = name.to_string();
        let message = message.map(String::from);
        let target = target.map(String::from);
        self.run(path, move |e, p| {
            e.create_tag(p, &name, message.as_deref(), target.as_deref(), push, &progress)
        })
        .await
    }

    pub async fn fetch(
        &self,
        path: impl AsRef<Path>,
        progress: UnboundedSender<Progress>,
    ) -> Result<(), EngineError> {
        self.run(path, move |e, p| e.fetch(p, &progress)).await
    }

    pub async fn pull(
        &self,
        path: impl AsRef<Path>,
        progress: UnboundedSender<Progress>,
    ) -> Result<PullOutcome, EngineError> {
        self.run(path, move |e, p| e.pull(p, &progress)).await
    }

    pub async fn push(
        &self,
        path: impl AsRef<Path>,
        progress: UnboundedSender<Progress>,
    ) -> Result<(), EngineError> {
        self.run(path, move |e, p| e.push(p, &progress)).await
    }

    pub async fn summary(&self, path: impl AsRef<Path>) -> Result<RepoSummary, EngineError> {
        self.run(path, |e, p| e.summary(p)).await
    }

    pub async fn readme(&self, path: impl AsRef<Path>) -> Result<Option<String>, EngineError> {
        self.run(path, |e, p| e.readme(p)).await
    }
}
