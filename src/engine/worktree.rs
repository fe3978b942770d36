//! engine::worktree
//!
//! Status, staging, working-copy diffs, commits, discarding and the stash.

use std::path::Path;

use super::progress::{self, ProgressSink};
use super::{Engine, EngineError};
use crate::core::diff::{self, BINARY_OR_EMPTY};
use crate::core::types::Oid;
use crate::git::{DeletionState, StashEntry, StatusEntry};

/// Diff text for two sides of one file.
///
/// Binary or missing content counts as empty. When both sides end up empty
/// and the file is not being deleted there is nothing meaningful to show,
/// so the [`BINARY_OR_EMPTY`] marker is returned instead.
pub(super) fn diff_text(
    old: Option<Vec<u8>>,
    new: Option<Vec<u8>>,
    deleted: bool,
    label: &str,
) -> String {
    let old = old.as_deref().and_then(diff::decode_text).unwrap_or_default();
    let new = new.as_deref().and_then(diff::decode_text).unwrap_or_default();

    if old.is_empty() && new.is_empty() && !deleted {
        return BINARY_OR_EMPTY.to_string();
    }
    diff::render(&diff::synthesize(&old, &new, label))
}

/// Commit message from its subject and optional body.
pub fn commit_message(subject: &str, body: &str) -> String {
    if body.is_empty() {
        subject.to_string()
    } else {
        format!("{subject}\n\n{body}")
    }
}

impl Engine {
    /// Staged and unstaged changes of the working copy.
    pub fn status(&self, path: &Path) -> Result<Vec<StatusEntry>, EngineError> {
        self.with_repo(path, "status", |git| Ok(git.status_entries()?))
    }

    /// Stage one file; a file missing on disk stages its deletion.
    pub fn stage_file(&self, path: &Path, file: &str) -> Result<(), EngineError> {
        self.with_repo(path, "stage_file", |git| {
            git.stage_path(file)?;
            tracing::info!(file, "staged");
            Ok(())
        })
    }

    /// Reset one file's index entry to HEAD.
    pub fn unstage_file(&self, path: &Path, file: &str) -> Result<(), EngineError> {
        self.with_repo(path, "unstage_file", |git| {
            git.unstage_path(file)?;
            tracing::info!(file, "unstaged");
            Ok(())
        })
    }

    pub fn stage_all(&self, path: &Path) -> Result<(), EngineError> {
        self.with_repo(path, "stage_all", |git| {
            git.stage_all()?;
            tracing::info!("staged all changes");
            Ok(())
        })
    }

    pub fn unstage_all(&self, path: &Path) -> Result<(), EngineError> {
        self.with_repo(path, "unstage_all", |git| {
            git.unstage_all()?;
            tracing::info!("unstaged all changes");
            Ok(())
        })
    }

    /// Diff of one file, rendered as hunk text.
    ///
    /// Staged: HEAD against the index. Unstaged: the index against the file
    /// on disk. The deleted side of a deletion is empty.
    pub fn file_diff(&self, path: &Path, file: &str, staged: bool) -> Result<String, EngineError> {
        self.with_repo(path, "file_diff", |git| {
            let DeletionState {
                staged: staged_deleted,
                worktree: worktree_deleted,
            } = git.deletion_state(file)?;

            let (old, new) = if staged {
                let new = if staged_deleted {
                    None
                } else {
                    git.index_content(file)?
                };
                (git.head_content(file)?, new)
            } else {
                let new = if worktree_deleted {
                    None
                } else {
                    git.worktree_content(file)?
                };
                (git.index_content(file)?, new)
            };

            Ok(diff_text(old, new, staged_deleted || worktree_deleted, file))
        })
    }

    /// Commit the staged changes.
    ///
    /// The message is `subject`, followed by a blank line and `body` when
    /// the body is non-empty. Progress reports "Commit completed" or
    /// "Commit failed: ...".
    pub fn commit(
        &self,
        path: &Path,
        subject: &str,
        body: &str,
        amend: bool,
        sink: &dyn ProgressSink,
    ) -> Result<Oid, EngineError> {
        progress::tracked(sink, "Committing changes...", "Commit", |_| {
            let config = self.config(path)?;
            self.with_repo(path, "commit", |git| {
                let message = commit_message(subject, body);
                let oid = git.commit_index(&message, amend, config.identity())?;
                tracing::info!(oid = %oid.short(7), amend, "committed");
                Ok(oid)
            })
        })
    }

    /// Throw away worktree changes to `files`: tracked files go back to
    /// their index version, untracked files are deleted.
    pub fn discard_changes(&self, path: &Path, files: &[String]) -> Result<(), EngineError> {
        if files.is_empty() {
            return Ok(());
        }
        self.with_repo(path, "discard_changes", |git| {
            git.discard_paths(files)?;
            tracing::info!(files = files.len(), "discarded changes");
            Ok(())
        })
    }

    /// Stash the changes of `files`, leaving every other change in place.
    ///
    /// Returns `None` when `files` is empty.
    pub fn stash_save(
        &self,
        path: &Path,
        files: &[String],
        message: Option<&str>,
    ) -> Result<Option<Oid>, EngineError> {
        if files.is_empty() {
            return Ok(None);
        }
        let config = self.config(path)?;
        self.with_repo(path, "stash_save", |git| {
            let oid = git.stash_save(files, message, config.identity())?;
            tracing::info!(oid = %oid.short(7), files = files.len(), "stashed");
            Ok(Some(oid))
        })
    }

    /// Stash entries, most recent first.
    pub fn stashes(&self, path: &Path) -> Result<Vec<StashEntry>, EngineError> {
        self.with_repo_mut(path, "stashes", |git| Ok(git.stashes()?))
    }

    pub fn stash_drop(&self, path: &Path, index: usize) -> Result<(), EngineError> {
        self.with_repo_mut(path, "stash_drop", |git| {
            git.stash_drop(index)?;
            tracing::info!(index, "dropped stash");
            Ok(())
        })
    }

    /// Apply stash entry `index` and remove it from the list.
    pub fn stash_pop(&self, path: &Path, index: usize) -> Result<(), EngineError> {
        self.with_repo_mut(path, "stash_pop", |git| {
            git.stash_pop(index)?;
            tracing::info!(index, "popped stash");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_joins_body_after_blank_line() {
        assert_eq!(commit_message("Subject", ""), "Subject");
        assert_eq!(commit_message("Subject", "Body"), "Subject\n\nBody");
    }

    mod diff_text {
        use super::*;

        #[test]
        fn both_empty_is_marker() {
            assert_eq!(diff_text(None, None, false, "f"), BINARY_OR_EMPTY);
            assert_eq!(diff_text(Some(Vec::new()), Some(Vec::new()), false, "f"), BINARY_OR_EMPTY);
        }

        #[test]
        fn binary_counts_as_empty() {
            let binary = vec![0u8, 1, 2, 3];
            assert_eq!(diff_text(Some(binary.clone()), Some(binary), false, "f"), BINARY_OR_EMPTY);
        }

        #[test]
        fn deletion_of_empty_file_is_not_marker() {
            assert_eq!(diff_text(Some(Vec::new()), None, true, "f"), "");
        }

        #[test]
        fn deletion_lists_removed_lines() {
            let text = diff_text(Some(b"one\ntwo\n".to_vec()), None, true, "f");
            assert_eq!(text, "@@ -1,2 +1,0 @@\n-one\n-two\n");
        }

        #[test]
        fn new_file_lists_added_lines() {
            let text = diff_text(None, Some(b"hello\n".to_vec()), false, "f");
            assert_eq!(text, "@@ -1,0 +1,1 @@\n+hello\n");
        }
    }
}
