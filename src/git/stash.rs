//! git::stash
//!
//! Discarding worktree changes and the stash: save, list, drop and pop.
//!
//! # Stash layout
//!
//! A saved entry has the shape `git stash` writes: a worktree commit whose
//! parents are HEAD and an index commit, recorded in the `refs/stash`
//! reflog. Only the requested files are stashed; every other change stays
//! in the worktree and the index.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::interface::{internal, to_oid, Git, GitError};
use crate::core::types::Oid;

const STASH_REF: &str = "refs/stash";

/// One stash entry, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    /// Position in the stash list; `0` is the most recent.
    pub index: usize,
    /// Reflog message, e.g. `On main: wip`.
    pub message: String,
    /// Branch the entry was saved on.
    pub branch: Option<String>,
    pub oid: Oid,
}

/// Branch named by a stash message (`WIP on <branch>: ...` or
/// `On <branch>: ...`).
pub(crate) fn stash_branch(message: &str) -> Option<String> {
    let rest = message
        .strip_prefix("WIP on ")
        .or_else(|| message.strip_prefix("On "))?;
    let (branch, _) = rest.split_once(": ")?;
    Some(branch.to_string())
}

fn stash_error(err: git2::Error, index: usize) -> GitError {
    match err.code() {
        git2::ErrorCode::NotFound => GitError::RefNotFound {
            refname: format!("stash@{{{index}}}"),
        },
        git2::ErrorCode::Conflict | git2::ErrorCode::MergeConflict => GitError::CheckoutConflict {
            message: err.message().to_string(),
        },
        _ => internal(err),
    }
}

fn remove_worktree_file(root: &Path, file: &str) -> Result<(), GitError> {
    match fs::remove_file(root.join(file)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GitError::AccessError {
            message: format!("{}: {}", file, e),
        }),
    }
}

impl Git {
    /// Throw away worktree changes to `files`.
    ///
    /// Tracked files are restored from the index, so staged changes
    /// survive. Untracked files are deleted. Every path is checked before
    /// anything is touched; a path that is neither tracked nor untracked
    /// fails with [`GitError::ObjectNotFound`].
    pub fn discard_paths(&self, files: &[String]) -> Result<(), GitError> {
        let index = self.repo.index().map_err(internal)?;
        let mut tracked = Vec::new();
        let mut untracked = Vec::new();

        for file in files {
            if index.get_path(Path::new(file), 0).is_some() {
                tracked.push(file.as_str());
                continue;
            }
            match self.repo.status_file(Path::new(file)) {
                Ok(status) if status.is_wt_new() => untracked.push(file.as_str()),
                Ok(_) => return Err(GitError::ObjectNotFound { oid: file.clone() }),
                Err(e) if e.code() == git2::ErrorCode::NotFound => {
                    return Err(GitError::ObjectNotFound { oid: file.clone() })
                }
                Err(e) => return Err(GitError::from_git2(e, file)),
            }
        }

        if !tracked.is_empty() {
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout
                .force()
                .recreate_missing(true)
                .disable_pathspec_match(true);
            for file in &tracked {
                checkout.path(*file);
            }
            self.repo
                .checkout_index(None, Some(&mut checkout))
                .map_err(internal)?;
        }

        let root = self.work_dir()?;
        for file in untracked {
            remove_worktree_file(root, file)?;
        }
        Ok(())
    }

    /// Stash the staged and unstaged changes of `files`.
    ///
    /// The files are staged first, recorded as a new stash entry, then
    /// reset to HEAD in both the index and the worktree. Files HEAD does not
    /// have are removed. With no message the entry is named after HEAD, as
    /// `git stash` does.
    ///
    /// # Errors
    ///
    /// - [`GitError::NoHead`] in a repository without commits
    /// - [`GitError::NothingToStash`] when the files match HEAD
    pub fn stash_save(
        &self,
        files: &[String],
        message: Option<&str>,
        fallback_identity: Option<(&str, &str)>,
    ) -> Result<Oid, GitError> {
        let head = self.head_commit()?;
        let head_tree = head.tree().map_err(internal)?;

        for file in files {
            self.stage_path(file)?;
        }

        // HEAD's tree with only the requested files taken from the index.
        let index = self.repo.index().map_err(internal)?;
        let mut stashed = git2::Index::new().map_err(internal)?;
        stashed.read_tree(&head_tree).map_err(internal)?;
        for file in files {
            match index.get_path(Path::new(file), 0) {
                Some(entry) => stashed.add(&entry).map_err(internal)?,
                None => stashed
                    .remove_path(Path::new(file))
                    .map_err(|e| GitError::from_git2(e, file))?,
            }
        }
        let tree_oid = stashed.write_tree_to(&self.repo).map_err(internal)?;
        if tree_oid == head_tree.id() {
            return Err(GitError::NothingToStash);
        }
        let tree = self.repo.find_tree(tree_oid).map_err(internal)?;

        let branch = self
            .current_branch()?
            .map_or_else(|| "(no branch)".to_string(), |b| b.to_string());
        let head_id = head.id().to_string();
        let head_label = format!(
            "{} {}",
            &head_id[..7],
            String::from_utf8_lossy(head.summary_bytes().unwrap_or_default())
        );
        let reflog_message = match message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => format!("On {branch}: {m}"),
            None => format!("WIP on {branch}: {head_label}"),
        };

        let sig = self.signature(fallback_identity)?;
        let index_commit = self
            .repo
            .commit(None, &sig, &sig, &format!("index on {branch}: {head_label}"), &tree, &[&head])
            .and_then(|oid| self.repo.find_commit(oid))
            .map_err(internal)?;
        let stash_oid = self
            .repo
            .commit(None, &sig, &sig, &reflog_message, &tree, &[&head, &index_commit])
            .map_err(internal)?;

        self.repo
            .reference_ensure_log(STASH_REF)
            .map_err(|e| GitError::from_git2(e, STASH_REF))?;
        self.repo
            .reference(STASH_REF, stash_oid, true, &reflog_message)
            .map_err(|e| GitError::from_git2(e, STASH_REF))?;

        // Put the stashed files back to their HEAD state.
        self.repo
            .reset_default(Some(head.as_object()), files.iter().map(String::as_str))
            .map_err(internal)?;
        let (in_head, added): (Vec<&String>, Vec<&String>) = files
            .iter()
            .partition(|f| head_tree.get_path(Path::new(f.as_str())).is_ok());
        if !in_head.is_empty() {
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout
                .force()
                .recreate_missing(true)
                .disable_pathspec_match(true);
            for file in &in_head {
                checkout.path(file.as_str());
            }
            self.repo
                .checkout_head(Some(&mut checkout))
                .map_err(internal)?;
        }
        let root = self.work_dir()?;
        for file in added {
            remove_worktree_file(root, file)?;
        }

        to_oid(stash_oid)
    }

    /// Stash entries, most recent first.
    pub fn stashes(&mut self) -> Result<Vec<StashEntry>, GitError> {
        let mut raw = Vec::new();
        self.repo
            .stash_foreach(|index, message, oid| {
                raw.push((index, message.to_string(), *oid));
                true
            })
            .map_err(internal)?;

        raw.into_iter()
            .map(|(index, message, oid)| {
                Ok(StashEntry {
                    index,
                    branch: stash_branch(&message),
                    message,
                    oid: to_oid(oid)?,
                })
            })
            .collect()
    }

    /// Remove stash entry `index` without applying it.
    pub fn stash_drop(&mut self, index: usize) -> Result<(), GitError> {
        self.repo
            .stash_drop(index)
            .map_err(|e| stash_error(e, index))
    }

    /// Apply stash entry `index` to the worktree and remove it.
    ///
    /// Local changes that would be overwritten abort the pop and keep the
    /// entry.
    pub fn stash_pop(&mut self, index: usize) -> Result<(), GitError> {
        let mut options = git2::StashApplyOptions::new();
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        options.checkout_options(checkout);
        self.repo
            .stash_pop(index, Some(&mut options))
            .map_err(|e| stash_error(e, index))
    }
}
