//! engine::refs
//!
//! Branches and tags: listing, checkout, creation and deletion.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::progress::{self, ProgressSink};
use super::{Engine, EngineError};
use crate::core::branch_tree::BranchTree;
use crate::core::types::{BranchName, Oid, RefName, TypeError};
use crate::git::{BranchInfo, Git, TagInfo};

/// Remote-tracking branches of one remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBranches {
    pub remote: String,
    /// Short names, e.g. `origin/main`.
    pub branches: Vec<String>,
}

/// Which tags [`Engine::create_tag`] pushes after creating the tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagPush {
    /// Keep the tag local.
    #[default]
    None,
    /// Push the new tag.
    Tag,
    /// Push every local tag.
    All,
}

/// Group remote-tracking refs under their remotes.
///
/// Every configured remote gets an entry, even with no branches fetched yet.
pub(super) fn group_remote_branches(remotes: &[String], refs: &[RefName]) -> Vec<RemoteBranches> {
    remotes
        .iter()
        .map(|remote| {
            let mut branches: Vec<String> = refs
                .iter()
                .filter(|r| r.remote() == Some(remote.as_str()))
                .map(RefName::short)
                .collect();
            branches.sort();
            RemoteBranches {
                remote: remote.clone(),
                branches,
            }
        })
        .collect()
}

fn remote_branches_of(git: &Git) -> Result<Vec<RemoteBranches>, EngineError> {
    let remotes = git.remote_names()?;
    let refs = git.remote_branch_refs()?;
    Ok(group_remote_branches(&remotes, &refs))
}

impl Engine {
    /// Local branches, sorted, with the current one marked.
    pub fn branches(&self, path: &Path) -> Result<Vec<BranchInfo>, EngineError> {
        self.with_repo(path, "branches", |git| Ok(git.list_branches()?))
    }

    /// Remote-tracking branches grouped per remote.
    pub fn remote_branches(&self, path: &Path) -> Result<Vec<RemoteBranches>, EngineError> {
        self.with_repo(path, "remote_branches", remote_branches_of)
    }

    pub fn tags(&self, path: &Path) -> Result<Vec<TagInfo>, EngineError> {
        self.with_repo(path, "tags", |git| Ok(git.list_tags()?))
    }

    /// Local branches grouped into folders by their `/` segments.
    pub fn branch_tree(&self, path: &Path) -> Result<BranchTree, EngineError> {
        let branches = self.branches(path)?;
        let names: Vec<BranchName> = branches.into_iter().map(|b| b.name).collect();
        Ok(BranchTree::build(&names))
    }

    /// Check out a branch.
    ///
    /// With `is_remote`, `name` is a remote branch such as `origin/feature`:
    /// the local `feature` is checked out, created at the remote tip and
    /// set to track it when it does not exist yet.
    pub fn checkout(&self, path: &Path, name: &str, is_remote: bool) -> Result<(), EngineError> {
        self.with_repo(path, "checkout", |git| {
            let local = if is_remote {
                let remote_ref = RefName::remote_from_short(name)?;
                let branch = remote_ref.branch().cloned().ok_or_else(|| {
                    TypeError::InvalidRefName(format!("{name}: not a remote branch"))
                })?;
                if git.branch_exists(&branch) {
                    branch
                } else {
                    let created = git.create_tracking_branch(&remote_ref)?;
                    tracing::info!(branch = %created, upstream = name, "created tracking branch");
                    created
                }
            } else {
                BranchName::new(name)?
            };

            git.checkout_branch(&local)?;
            tracing::info!(branch = %local, "checked out");
            Ok(())
        })
    }

    /// Create a branch at `start_point` (default HEAD), optionally checking
    /// it out.
    ///
    /// A failed checkout removes the new branch again.
    pub fn create_branch(
        &self,
        path: &Path,
        name: &str,
        start_point: Option<&str>,
        checkout: bool,
    ) -> Result<Oid, EngineError> {
        let branch = BranchName::new(name)?;
        self.with_repo(path, "create_branch", |git| {
            let oid = git.create_branch(&branch, start_point)?;
            tracing::info!(branch = %branch, at = %oid.short(7), "created branch");

            if checkout {
                if let Err(e) = git.checkout_branch(&branch) {
                    if let Err(cleanup) = git.delete_branch(&branch) {
                        tracing::warn!(branch = %branch, error = %cleanup, "could not remove branch after failed checkout");
                    }
                    return Err(e.into());
                }
            }
            Ok(oid)
        })
    }

    /// Delete a local branch, and with `delete_remote` the branch of the
    /// same name on the configured remote.
    ///
    /// The remote deletion reports progress; the local branch is already
    /// gone if it fails.
    pub fn delete_branch(
        &self,
        path: &Path,
        name: &str,
        delete_remote: bool,
        sink: &dyn ProgressSink,
    ) -> Result<(), EngineError> {
        let branch = BranchName::new(name)?;
        let config = self.config(path)?;
        self.with_repo(path, "delete_branch", |git| {
            git.delete_branch(&branch)?;
            tracing::info!(branch = %branch, "deleted branch");

            if !delete_remote {
                return Ok(());
            }
            let remote = config.remote();
            let start = format!("Deleting {remote}/{branch}...");
            progress::tracked::<_, EngineError, _>(sink, &start, "Delete", |relay| {
                git.delete_remote_branch(remote, &branch, config.ssh_key(), &mut |e| relay.observe(e))?;
                tracing::info!(remote, branch = %branch, "deleted remote branch");
                Ok(())
            })
        })
    }

    /// Tag `target` (default HEAD). A message makes the tag annotated.
    ///
    /// With `push` other than [`TagPush::None`] the tag, or every tag, is
    /// then pushed to the configured remote with progress. The local tag
    /// stays if the push fails.
    pub fn create_tag(
        &self,
        path: &Path,
        name: &str,
        message: Option<&str>,
        target: Option<&str>,
        push: TagPush,
        sink: &dyn ProgressSink,
    ) -> Result<Oid, EngineError> {
        let config = self.config(path)?;
        let message = message.filter(|m| !m.trim().is_empty());
        self.with_repo(path, "create_tag", |git| {
            let oid = git.create_tag(name, message, target, config.identity())?;
            tracing::info!(tag = name, at = %oid.short(7), annotated = message.is_some(), "created tag");

            let tags = match push {
                TagPush::None => return Ok(oid),
                TagPush::Tag => vec![name.to_string()],
                TagPush::All => git.list_tags()?.into_iter().map(|t| t.name).collect(),
            };
            let remote = config.remote();
            let start = format!("Pushing tags to {remote}...");
            progress::tracked::<_, EngineError, _>(sink, &start, "Push", |relay| {
                git.push_tags(remote, &tags, config.ssh_key(), &mut |e| relay.observe(e))?;
                tracing::info!(remote, tags = tags.len(), "pushed tags");
                Ok(())
            })?;
            Ok(oid)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_remote() {
        let refs: Vec<RefName> = ["origin/main", "upstream/main", "origin/feature/x"]
            .iter()
            .map(|s| RefName::remote_from_short(s).unwrap())
            .collect();
        let remotes = vec!["origin".to_string(), "upstream".to_string(), "empty".to_string()];

        let grouped = group_remote_branches(&remotes, &refs);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].branches, vec!["origin/feature/x", "origin/main"]);
        assert_eq!(grouped[1].branches, vec!["upstream/main"]);
        assert!(grouped[2].branches.is_empty());
    }
}
