//! git::interface
//!
//! Git primitive accessor implemented with git2.
//!
//! This module is the **single doorway** to repository storage. Everything
//! the engine needs from a working copy (status, index edits, blob reads,
//! commits, refs, checkouts) is a method on [`Git`], returning crate types
//! rather than git2 types.
//!
//! # Architecture
//!
//! The `Git` struct wraps one `git2::Repository`. No module outside `git`
//! imports `git2`. Network operations live in the sibling `remote` module
//! as a second `impl Git` block.
//!
//! # Error Handling
//!
//! git2 errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: The path is not a repository (callers offer to
//!   initialize one)
//! - [`GitError::NoHead`]: The repository has no commits yet
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::SshKeyNotFound`] / [`GitError::Transport`]: Remote failures
//!
//! # Example
//!
//! ```ignore
//! use gitlane::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/path/to/repo"))?;
//! for entry in git.status_entries()? {
//!     println!("{} {}", entry.status, entry.path);
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// Substring carried by every missing-key failure, so front ends can offer
/// SSH key setup instead of a generic error.
pub const SSH_KEY_NOT_FOUND: &str = "SSH key not found";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path is not a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// The repository has no commits yet.
    #[error("no HEAD reference found")]
    NoHead,

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID or path that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A branch or tag with this name already exists.
    #[error("{name} already exists")]
    AlreadyExists {
        /// The conflicting name
        name: String,
    },

    /// The index matches HEAD.
    #[error("nothing to commit")]
    NothingToCommit,

    /// The files to stash have no changes.
    #[error("no local changes to save")]
    NothingToStash,

    /// The upstream has diverged from the local branch.
    #[error("cannot fast-forward {branch}: local and remote have diverged")]
    NonFastForward {
        /// The local branch
        branch: String,
    },

    /// The operation needs HEAD to be on a branch.
    #[error("HEAD is detached")]
    DetachedHead,

    /// Local changes would be overwritten.
    #[error("checkout conflict: {message}")]
    CheckoutConflict {
        /// Description from the checkout
        message: String,
    },

    /// No remote with that name is configured.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// No usable SSH private key.
    #[error("SSH key not found: add ~/.ssh/id_ed25519 or ~/.ssh/id_rsa, or set ssh_key in the gitlane config")]
    SshKeyNotFound,

    /// Network, authentication or server-side failure.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    pub(super) fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::UnbornBranch => GitError::NoHead,
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Exists => GitError::AlreadyExists {
                name: context.to_string(),
            },
            git2::ErrorCode::Conflict => GitError::CheckoutConflict {
                message: err.message().to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Categorize a failure from fetch or push.
    pub(super) fn from_transport(err: git2::Error) -> Self {
        if err.message().contains(SSH_KEY_NOT_FOUND) {
            GitError::SshKeyNotFound
        } else {
            GitError::Transport {
                message: err.message().to_string(),
            }
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::UnbornBranch => GitError::NoHead,
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// One line of the status view.
///
/// A file with both staged and unstaged changes produces two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub path: String,
    /// One of `M A D R C U ?`.
    pub status: char,
    pub staged: bool,
}

/// A file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitChange {
    pub path: String,
    /// `A`, `M` or `D`.
    pub status: char,
}

/// A local branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    pub name: BranchName,
    pub is_current: bool,
    /// Short name of the tracked remote branch, e.g. `origin/main`.
    pub upstream: Option<String>,
}

/// A tag and the commit it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub target: Oid,
    pub annotated: bool,
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// Parent OIDs, primary parent first
    pub parents: Vec<Oid>,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: DateTime<Utc>,
    /// Committer timestamp
    pub commit_time: DateTime<Utc>,
}

/// Which sides of a file are deleted, as seen by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionState {
    pub staged: bool,
    pub worktree: bool,
}

/// The Git interface.
///
/// This is the **single point of interaction** with repository storage.
pub struct Git {
    pub(super) repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

pub(super) fn to_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(oid.to_string()).map_err(GitError::from)
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn timestamp(time: git2::Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.seconds(), 0).unwrap_or(DateTime::UNIX_EPOCH)
}

pub(super) fn internal(e: git2::Error) -> GitError {
    GitError::Internal {
        message: e.message().to_string(),
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open the repository whose working copy root is `path`.
    ///
    /// Unlike discovery, a subdirectory of a repository is not accepted; the
    /// front end always passes the root it was given.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::NotARepo {
                path: path.to_path_buf(),
            },
            _ => GitError::from_git2(e, &path.display().to_string()),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Create a new non-bare repository at `path`.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::init(path)
            .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
        Ok(Self { repo })
    }

    /// Whether `path` is a repository.
    ///
    /// Only "not a repository" maps to `false`; other open failures are
    /// errors.
    pub fn is_repo(path: &Path) -> Result<bool, GitError> {
        match git2::Repository::open(path) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(GitError::from_git2(e, &path.display().to_string())),
        }
    }

    /// Root of the working copy.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    /// Get direct access to the .git directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Working Tree Status
    // =========================================================================

    /// Status entries for every changed file.
    ///
    /// Staged and unstaged changes of the same file are separate entries;
    /// untracked files only appear unstaged (`?`).
    pub fn status_entries(&self) -> Result<Vec<StatusEntry>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .renames_head_to_index(true);

        let statuses = self.repo.statuses(Some(&mut opts)).map_err(internal)?;

        let mut entries = Vec::new();
        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                if let Some(path) = entry.path() {
                    entries.push(StatusEntry {
                        path: path.to_string(),
                        status: 'U',
                        staged: false,
                    });
                }
                continue;
            }

            let staged_char = if status.is_index_new() {
                Some('A')
            } else if status.is_index_deleted() {
                Some('D')
            } else if status.is_index_renamed() {
                Some('R')
            } else if status.is_index_modified() || status.is_index_typechange() {
                Some('M')
            } else {
                None
            };
            if let Some(c) = staged_char {
                let path = entry
                    .head_to_index()
                    .and_then(|d| d.new_file().path().map(|p| p.to_string_lossy().into_owned()))
                    .or_else(|| entry.path().map(String::from));
                if let Some(path) = path {
                    entries.push(StatusEntry {
                        path,
                        status: c,
                        staged: true,
                    });
                }
            }

            let unstaged_char = if status.is_wt_new() {
                Some('?')
            } else if status.is_wt_deleted() {
                Some('D')
            } else if status.is_wt_renamed() {
                Some('R')
            } else if status.is_wt_modified() || status.is_wt_typechange() {
                Some('M')
            } else {
                None
            };
            if let Some(c) = unstaged_char {
                let path = entry
                    .index_to_workdir()
                    .and_then(|d| d.new_file().path().map(|p| p.to_string_lossy().into_owned()))
                    .or_else(|| entry.path().map(String::from));
                if let Some(path) = path {
                    entries.push(StatusEntry {
                        path,
                        status: c,
                        staged: false,
                    });
                }
            }
        }

        Ok(entries)
    }

    /// Check if the working tree has no staged, unstaged or untracked changes.
    pub fn is_worktree_clean(&self) -> Result<bool, GitError> {
        Ok(self.status_entries()?.is_empty())
    }

    /// Whether `file` is deleted in the index and/or the worktree.
    pub fn deletion_state(&self, file: &str) -> Result<DeletionState, GitError> {
        match self.repo.status_file(Path::new(file)) {
            Ok(status) => Ok(DeletionState {
                staged: status.is_index_deleted(),
                worktree: status.is_wt_deleted(),
            }),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(DeletionState::default()),
            Err(e) => Err(GitError::from_git2(e, file)),
        }
    }

    // =========================================================================
    // Index
    // =========================================================================

    /// Stage one path; a path missing from the worktree stages its deletion.
    pub fn stage_path(&self, file: &str) -> Result<(), GitError> {
        let mut index = self.repo.index().map_err(internal)?;
        let on_disk = self.work_dir()?.join(file);

        if fs::symlink_metadata(&on_disk).is_ok() {
            index
                .add_path(Path::new(file))
                .map_err(|e| GitError::from_git2(e, file))?;
        } else {
            index
                .remove_path(Path::new(file))
                .map_err(|e| GitError::from_git2(e, file))?;
        }

        index.write().map_err(internal)
    }

    /// Stage every change, including deletions and untracked files.
    pub fn stage_all(&self) -> Result<(), GitError> {
        let mut index = self.repo.index().map_err(internal)?;
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .map_err(internal)?;
        index.update_all(["*"].iter(), None).map_err(internal)?;
        index.write().map_err(internal)
    }

    pub(super) fn head_commit(&self) -> Result<git2::Commit<'_>, GitError> {
        let head = self.repo.head().map_err(|e| match e.code() {
            git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound => GitError::NoHead,
            _ => GitError::from_git2(e, "HEAD"),
        })?;
        head.peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))
    }

    fn try_head_commit(&self) -> Result<Option<git2::Commit<'_>>, GitError> {
        match self.head_commit() {
            Ok(commit) => Ok(Some(commit)),
            Err(GitError::NoHead) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reset one index entry to its HEAD version.
    ///
    /// # Errors
    ///
    /// [`GitError::NoHead`] when there is no commit to reset to.
    pub fn unstage_path(&self, file: &str) -> Result<(), GitError> {
        let head = self.head_commit()?;
        self.repo
            .reset_default(Some(head.as_object()), [file])
            .map_err(|e| GitError::from_git2(e, file))
    }

    /// Mixed reset of the whole index to HEAD.
    pub fn unstage_all(&self) -> Result<(), GitError> {
        let head = self.head_commit()?;
        self.repo
            .reset(head.as_object(), git2::ResetType::Mixed, None)
            .map_err(internal)
    }

    // =========================================================================
    // Content
    // =========================================================================

    fn tree_blob(&self, tree: &git2::Tree<'_>, file: &str) -> Result<Option<Vec<u8>>, GitError> {
        let entry = match tree.get_path(Path::new(file)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, file)),
        };
        match self.repo.find_blob(entry.id()) {
            Ok(blob) => Ok(Some(blob.content().to_vec())),
            // Submodules and directories have no blob.
            Err(_) => Ok(None),
        }
    }

    /// Contents of `file` at HEAD; `None` when unborn or absent.
    pub fn head_content(&self, file: &str) -> Result<Option<Vec<u8>>, GitError> {
        match self.try_head_commit()? {
            Some(commit) => {
                let tree = commit.tree().map_err(internal)?;
                self.tree_blob(&tree, file)
            }
            None => Ok(None),
        }
    }

    /// Contents of the stage-0 index entry for `file`.
    pub fn index_content(&self, file: &str) -> Result<Option<Vec<u8>>, GitError> {
        let index = self.repo.index().map_err(internal)?;
        match index.get_path(Path::new(file), 0) {
            Some(entry) => {
                let blob = self
                    .repo
                    .find_blob(entry.id)
                    .map_err(|e| GitError::from_git2(e, file))?;
                Ok(Some(blob.content().to_vec()))
            }
            None => Ok(None),
        }
    }

    /// Contents of `file` on disk.
    pub fn worktree_content(&self, file: &str) -> Result<Option<Vec<u8>>, GitError> {
        match fs::read(self.work_dir()?.join(file)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GitError::AccessError {
                message: format!("{}: {}", file, e),
            }),
        }
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Signature from git config, else the supplied fallback identity.
    pub(super) fn signature(&self, fallback: Option<(&str, &str)>) -> Result<git2::Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(e) => match fallback {
                Some((name, email)) => {
                    tracing::debug!("no git identity configured, using fallback identity");
                    git2::Signature::now(name, email).map_err(internal)
                }
                None => Err(GitError::Internal {
                    message: format!("no commit identity: {}", e.message()),
                }),
            },
        }
    }

    /// Commit the index.
    ///
    /// A non-amend commit whose tree equals its parent's fails with
    /// [`GitError::NothingToCommit`] before anything is written. An amend
    /// replaces HEAD with the new message and the current index tree.
    pub fn commit_index(
        &self,
        message: &str,
        amend: bool,
        fallback_identity: Option<(&str, &str)>,
    ) -> Result<Oid, GitError> {
        let mut index = self.repo.index().map_err(internal)?;
        let parent = self.try_head_commit()?;

        let tree_oid = index.write_tree().map_err(internal)?;
        let tree = self.repo.find_tree(tree_oid).map_err(internal)?;
        let sig = self.signature(fallback_identity)?;

        let oid = if amend {
            let head = parent.ok_or(GitError::NoHead)?;
            head.amend(Some("HEAD"), None, Some(&sig), None, Some(message), Some(&tree))
                .map_err(internal)?
        } else {
            let unchanged = match &parent {
                Some(p) => p.tree_id() == tree_oid,
                None => index.is_empty(),
            };
            if unchanged {
                return Err(GitError::NothingToCommit);
            }
            let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
                .map_err(internal)?
        };

        to_oid(oid)
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    /// Messages and names in other encodings are decoded lossily.
    fn commit_info_of(commit: &git2::Commit<'_>) -> Result<CommitInfo, GitError> {
        let author = commit.author();
        Ok(CommitInfo {
            oid: to_oid(commit.id())?,
            parents: commit
                .parent_ids()
                .map(to_oid)
                .collect::<Result<Vec<_>, _>>()?,
            summary: commit
                .summary_bytes()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            author_time: timestamp(author.when()),
            commit_time: timestamp(commit.committer().when()),
        })
    }

    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        Self::commit_info_of(&self.find_commit(oid)?)
    }

    /// Resolve a revision (`HEAD`, branch, tag, hash) to a commit.
    pub fn resolve_commit(&self, rev: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, &format!("ref {rev}")))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, rev))?;
        to_oid(commit.id())
    }

    /// Get HEAD commit OID.
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        to_oid(self.head_commit()?.id())
    }

    fn first_parent_tree<'r>(commit: &git2::Commit<'r>) -> Result<Option<git2::Tree<'r>>, GitError> {
        match commit.parents().next() {
            Some(parent) => Ok(Some(parent.tree().map_err(internal)?)),
            None => Ok(None),
        }
    }

    /// Files changed by a commit relative to its first parent.
    ///
    /// Root commits are compared with the empty tree.
    pub fn commit_changes(&self, oid: &Oid) -> Result<Vec<CommitChange>, GitError> {
        let commit = self.find_commit(oid)?;
        let tree = commit.tree().map_err(internal)?;
        let parent_tree = Self::first_parent_tree(&commit)?;

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(internal)?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let (status, file) = match delta.status() {
                git2::Delta::Added => ('A', delta.new_file()),
                git2::Delta::Deleted => ('D', delta.old_file()),
                _ => ('M', delta.new_file()),
            };
            if let Some(path) = file.path() {
                changes.push(CommitChange {
                    path: path.to_string_lossy().into_owned(),
                    status,
                });
            }
        }
        Ok(changes)
    }

    /// `file` in the commit's first parent and in the commit itself.
    pub fn commit_file_contents(
        &self,
        oid: &Oid,
        file: &str,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>), GitError> {
        let commit = self.find_commit(oid)?;
        let tree = commit.tree().map_err(internal)?;
        let old = match Self::first_parent_tree(&commit)? {
            Some(parent) => self.tree_blob(&parent, file)?,
            None => None,
        };
        let new = self.tree_blob(&tree, file)?;
        Ok((old, new))
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Short names of HEAD and every reference, paired with the commit each
    /// resolves to.
    ///
    /// Symbolic refs are followed and annotated tags peeled. References that
    /// cannot be resolved to a commit are skipped.
    pub fn ref_targets(&self) -> Vec<(String, Oid)> {
        let mut targets = Vec::new();

        if let Ok(Some(head)) = self.try_head_commit() {
            if let Ok(oid) = to_oid(head.id()) {
                targets.push(("HEAD".to_string(), oid));
            }
        }

        let references = match self.repo.references() {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!(error = %e.message(), "cannot enumerate references");
                return targets;
            }
        };

        for reference in references {
            let reference = match reference {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e.message(), "skipping unreadable reference");
                    continue;
                }
            };
            let Some(name) = reference.name().map(String::from) else {
                continue;
            };
            let resolved = match reference.resolve() {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(refname = %name, error = %e.message(), "skipping dangling reference");
                    continue;
                }
            };
            let commit = match resolved.peel_to_commit() {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(refname = %name, error = %e.message(), "skipping non-commit reference");
                    continue;
                }
            };
            let short = RefName::parse(&name)
                .map(|r| r.short())
                .unwrap_or_else(|_| reference.shorthand().unwrap_or(&name).to_string());
            if let Ok(oid) = to_oid(commit.id()) {
                targets.push((short, oid));
            }
        }

        targets
    }

    /// Commits reachable from HEAD and every ref, newest committer time
    /// first (topologically consistent).
    ///
    /// `limit` of `None` walks everything. An empty repository yields an
    /// empty list.
    pub fn walk_commits(&self, limit: Option<usize>) -> Result<Vec<CommitInfo>, GitError> {
        let mut walk = self.repo.revwalk().map_err(internal)?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
            .map_err(internal)?;

        if let Ok(Some(head)) = self.try_head_commit() {
            walk.push(head.id()).map_err(internal)?;
        }
        for (name, oid) in self.ref_targets() {
            if let Err(e) = walk.push(to_git2_oid(&oid)?) {
                tracing::warn!(refname = %name, error = %e.message(), "skipping ref tip in history walk");
            }
        }

        let mut commits = Vec::new();
        for oid in walk {
            if limit.is_some_and(|n| commits.len() >= n) {
                break;
            }
            let oid = oid.map_err(internal)?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
            commits.push(Self::commit_info_of(&commit)?);
        }
        Ok(commits)
    }

    /// Number of commits reachable from HEAD.
    pub fn head_commit_count(&self) -> Result<usize, GitError> {
        let Some(head) = self.try_head_commit()? else {
            return Ok(0);
        };
        let mut walk = self.repo.revwalk().map_err(internal)?;
        walk.push(head.id()).map_err(internal)?;
        Ok(walk.count())
    }

    /// Author times of the oldest and newest commits reachable from HEAD.
    pub fn head_time_span(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, GitError> {
        let Some(head) = self.try_head_commit()? else {
            return Ok(None);
        };
        let newest = timestamp(head.author().when());

        let mut walk = self.repo.revwalk().map_err(internal)?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)
            .map_err(internal)?;
        walk.push(head.id()).map_err(internal)?;

        let oldest = match walk.next() {
            Some(oid) => {
                let commit = self.repo.find_commit(oid.map_err(internal)?).map_err(internal)?;
                let when = commit.author().when();
                timestamp(when)
            }
            None => newest,
        };
        Ok(Some((oldest, newest)))
    }

    // =========================================================================
    // Branches and Tags
    // =========================================================================

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached. An unborn HEAD reports the branch
    /// it will create.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                let target = self
                    .repo
                    .find_reference("HEAD")
                    .ok()
                    .and_then(|r| r.symbolic_target().map(String::from));
                return Ok(target
                    .as_deref()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .and_then(|b| BranchName::new(b).ok()));
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None) // Detached HEAD
    }

    pub fn list_branches(&self) -> Result<Vec<BranchInfo>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(internal)?;

        let mut infos = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(internal)?;
            let Some(name) = branch.name().ok().flatten() else {
                continue;
            };
            let Ok(name) = BranchName::new(name) else {
                continue;
            };
            let upstream = branch
                .upstream()
                .ok()
                .and_then(|u| u.name().ok().flatten().map(String::from));
            infos.push(BranchInfo {
                is_current: branch.is_head(),
                name,
                upstream,
            });
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// Every remote-tracking branch, excluding symbolic `<remote>/HEAD`.
    pub fn remote_branch_refs(&self) -> Result<Vec<RefName>, GitError> {
        let refs = self
            .repo
            .references_glob("refs/remotes/*")
            .map_err(internal)?;

        let mut names = Vec::new();
        for reference in refs {
            let reference = reference.map_err(internal)?;
            if reference.symbolic_target().is_some() {
                continue;
            }
            if let Some(Ok(name)) = reference.name().map(RefName::parse) {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn remote_names(&self) -> Result<Vec<String>, GitError> {
        let remotes = self.repo.remotes().map_err(internal)?;
        Ok(remotes.iter().flatten().map(String::from).collect())
    }

    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(internal(e)),
        }
    }

    pub fn list_tags(&self) -> Result<Vec<TagInfo>, GitError> {
        let refs = self.repo.references_glob("refs/tags/*").map_err(internal)?;

        let mut tags = Vec::new();
        for reference in refs {
            let reference = reference.map_err(internal)?;
            let Some(name) = reference.name().and_then(|n| n.strip_prefix("refs/tags/")) else {
                continue;
            };
            let name = name.to_string();
            let annotated = reference.peel_to_tag().is_ok();
            match reference.peel_to_commit() {
                Ok(commit) => tags.push(TagInfo {
                    name,
                    target: to_oid(commit.id())?,
                    annotated,
                }),
                Err(e) => tracing::warn!(tag = %name, error = %e.message(), "skipping tag"),
            }
        }
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    /// Message of the most recent stash, if any.
    pub fn latest_stash(&self) -> Option<String> {
        let reference = self.repo.find_reference("refs/stash").ok()?;
        let commit = reference.peel_to_commit().ok()?;
        Some(String::from_utf8_lossy(commit.message_bytes()).trim().to_string())
    }

    pub fn branch_exists(&self, name: &BranchName) -> bool {
        self.repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .is_ok()
    }

    /// Create a branch at `start` (a revision), or at HEAD.
    pub fn create_branch(&self, name: &BranchName, start: Option<&str>) -> Result<Oid, GitError> {
        let target = match start {
            Some(rev) => self.resolve_commit(rev)?,
            None => self.head_oid()?,
        };
        let commit = self.find_commit(&target)?;
        self.repo
            .branch(name.as_str(), &commit, false)
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;
        Ok(target)
    }

    /// Create a local branch at a remote branch tip, tracking it.
    pub fn create_tracking_branch(&self, remote_ref: &RefName) -> Result<BranchName, GitError> {
        let (Some(remote), Some(branch)) = (remote_ref.remote(), remote_ref.branch()) else {
            return Err(GitError::InvalidRefName {
                message: format!("{} is not a remote branch", remote_ref),
            });
        };
        let full = remote_ref.full();
        let commit = self
            .repo
            .find_reference(&full)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, &full))?;

        let mut local = self
            .repo
            .branch(branch.as_str(), &commit, false)
            .map_err(|e| GitError::from_git2(e, branch.as_str()))?;
        local
            .set_upstream(Some(&format!("{remote}/{branch}")))
            .map_err(internal)?;
        Ok(branch.clone())
    }

    /// Check out a local branch.
    ///
    /// The worktree update is safe: changes that would be overwritten abort
    /// the checkout before HEAD moves.
    pub fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = RefName::local(name.clone()).full();
        let commit = self
            .repo
            .find_reference(&refname)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, &refname))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))
    }

    pub fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = RefName::local(name.clone()).full();
        let mut branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        branch
            .delete()
            .map_err(|e| GitError::from_git2(e, &refname))
    }

    /// Create a tag at `target` (a revision) or HEAD.
    ///
    /// With a message the tag is annotated, otherwise lightweight.
    pub fn create_tag(
        &self,
        name: &str,
        message: Option<&str>,
        target: Option<&str>,
        fallback_identity: Option<(&str, &str)>,
    ) -> Result<Oid, GitError> {
        let tag_ref = RefName::tag(name)?;
        let commit_oid = match target {
            Some(rev) => self.resolve_commit(rev)?,
            None => self.head_oid()?,
        };
        let object = self.find_commit(&commit_oid)?.into_object();

        match message {
            Some(msg) => {
                let tagger = self
                    .signature(fallback_identity)
                    .or_else(|_| git2::Signature::now("gitlane", "gitlane@localhost").map_err(internal))?;
                self.repo
                    .tag(name, &object, &tagger, msg, false)
                    .map_err(|e| GitError::from_git2(e, &tag_ref.full()))?;
            }
            None => {
                self.repo
                    .tag_lightweight(name, &object, false)
                    .map_err(|e| GitError::from_git2(e, &tag_ref.full()))?;
            }
        }
        Ok(commit_oid)
    }
}
