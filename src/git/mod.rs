//! git
//!
//! Single interface for all repository storage and transport.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and
//! writes flow through [`Git`]. No other module imports `git2`, and nothing
//! shells out to the git CLI.
//!
//! # Responsibilities
//!
//! - Repository opening, initialization and detection
//! - Status, index edits and blob reads (HEAD, index, worktree, commits)
//! - Commits, history walks and ref resolution
//! - Branches, tags and checkouts
//! - Discarding worktree changes and the stash
//! - Fetch, fast-forward pull and push with credentials
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName, RefName)
//! - Mutations check their preconditions before touching the worktree
//!
//! # Example
//!
//! ```ignore
//! use gitlane::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/path/to/repo"))?;
//! git.stage_path("README.md")?;
//! let oid = git.commit_index("Update README", false, None)?;
//! println!("committed {}", oid.short(7));
//! ```

mod interface;
mod remote;
mod stash;

pub use interface::{
    BranchInfo, CommitChange, CommitInfo, DeletionState, Git, GitError, StatusEntry, TagInfo,
    SSH_KEY_NOT_FOUND,
};
pub use remote::{find_ssh_key, PullOutcome, TransportEvent};
pub use stash::StashEntry;
