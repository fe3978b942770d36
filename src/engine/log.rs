//! engine::log
//!
//! History browsing: commit lists, the laid-out graph, and per-commit diffs.

use std::path::Path;

use super::worktree::diff_text;
use super::{Engine, EngineError};
use crate::core::graph::{self, GraphLayout};
use crate::core::history::{self, CommitRecord};
use crate::git::CommitChange;

impl Engine {
    /// Up to `count` commits reachable from any ref, newest first.
    ///
    /// `count <= 0` loads the whole history.
    pub fn history(&self, path: &Path, count: i64) -> Result<Vec<CommitRecord>, EngineError> {
        self.with_repo(path, "history", |git| Ok(history::assemble(git, count)?))
    }

    /// History together with its lane layout, using the configured graph
    /// metrics.
    pub fn history_graph(
        &self,
        path: &Path,
        count: i64,
    ) -> Result<(Vec<CommitRecord>, GraphLayout), EngineError> {
        let metrics = self.config(path)?.layout_metrics();
        let records = self.history(path, count)?;
        let layout = graph::layout(&records, metrics);
        Ok((records, layout))
    }

    /// Files a commit changed relative to its first parent.
    ///
    /// `hash` may be any revision git understands; abbreviated hashes and
    /// ref names resolve to their commit.
    pub fn commit_changes(&self, path: &Path, hash: &str) -> Result<Vec<CommitChange>, EngineError> {
        self.with_repo(path, "commit_changes", |git| {
            let oid = git.resolve_commit(hash)?;
            Ok(git.commit_changes(&oid)?)
        })
    }

    /// Diff of one file between a commit's first parent and the commit.
    pub fn commit_file_diff(&self, path: &Path, hash: &str, file: &str) -> Result<String, EngineError> {
        self.with_repo(path, "commit_file_diff", |git| {
            let oid = git.resolve_commit(hash)?;
            let (old, new) = git.commit_file_contents(&oid, file)?;
            let deleted = old.is_some() && new.is_none();
            Ok(diff_text(old, new, deleted, file))
        })
    }
}
