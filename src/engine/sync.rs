//! engine::sync
//!
//! Fetch, pull and push against the configured remote.
//!
//! Each request reports through a [`ProgressSink`]: a start event, transport
//! progress, then "<Op> completed" at 100 or "<Op> failed: <error>" at -1.
//! The repository lock is held from just after the start event until the
//! transfer finishes. A missing SSH key fails with an error whose text
//! contains "SSH key not found".

use std::path::Path;

use super::progress::{self, ProgressSink};
use super::{Engine, EngineError};
use crate::git::PullOutcome;

impl Engine {
    /// Fetch the configured remote (default `origin`).
    pub fn fetch(&self, path: &Path, sink: &dyn ProgressSink) -> Result<(), EngineError> {
        let config = self.config(path)?;
        let remote = config.remote();
        progress::tracked(sink, &format!("Fetching {remote}..."), "Fetch", |relay| {
            self.with_repo(path, "fetch", |git| {
                git.fetch(remote, config.ssh_key(), &mut |e| relay.observe(e))?;
                tracing::info!(remote, "fetched");
                Ok(())
            })
        })
    }

    /// Fetch, then fast-forward the current branch to its upstream.
    ///
    /// Diverged branches fail with a non-fast-forward error and leave the
    /// worktree untouched. Being up to date is success.
    pub fn pull(&self, path: &Path, sink: &dyn ProgressSink) -> Result<PullOutcome, EngineError> {
        let config = self.config(path)?;
        let remote = config.remote();
        progress::tracked(sink, &format!("Pulling {remote}..."), "Pull", |relay| {
            self.with_repo(path, "pull", |git| {
                let outcome = git.pull_fast_forward(remote, config.ssh_key(), &mut |e| relay.observe(e))?;
                match &outcome {
                    PullOutcome::UpToDate => tracing::info!(remote, "already up to date"),
                    PullOutcome::FastForwarded { to, .. } => {
                        tracing::info!(remote, to = %to.short(7), "fast-forwarded")
                    }
                }
                Ok(outcome)
            })
        })
    }

    /// Push the current branch to the branch of the same name on the
    /// configured remote.
    pub fn push(&self, path: &Path, sink: &dyn ProgressSink) -> Result<(), EngineError> {
        let config = self.config(path)?;
        let remote = config.remote();
        progress::tracked(sink, &format!("Pushing to {remote}..."), "Push", |relay| {
            self.with_repo(path, "push", |git| {
                let branch = git.push_current_branch(remote, config.ssh_key(), &mut |e| relay.observe(e))?;
                tracing::info!(remote, branch = %branch, "pushed");
                Ok(())
            })
        })
    }
}
