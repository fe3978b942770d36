//! engine::summary
//!
//! Repository overview for the front end's landing page.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::refs::{group_remote_branches, RemoteBranches};
use super::{Engine, EngineError};
use crate::git::Git;

/// File names tried, in order, by [`Engine::readme`].
const README_NAMES: [&str; 4] = ["README.md", "readme.md", "README", "readme"];

/// Overview of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    /// Last component of the working copy path.
    pub name: String,
    /// Size of the `.git` directory in MiB.
    pub size_mb: f64,
    pub remote_url: Option<String>,
    /// Commits reachable from HEAD.
    pub commit_count: usize,
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
    pub is_clean: bool,
    /// Paths with staged or unstaged changes, each listed once.
    pub modified_files: Vec<String>,
    pub branches: Vec<String>,
    pub current_branch: Option<String>,
    pub remotes: Vec<RemoteBranches>,
    pub tags: Vec<String>,
    /// Message of the most recent stash.
    pub latest_stash: Option<String>,
}

/// Total size of the files below `root`.
///
/// Entries that vanish or cannot be read during the walk are skipped.
fn dir_size(root: &Path) -> u64 {
    let mut total = 0;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                pending.push(entry.path());
            } else {
                total += meta.len();
            }
        }
    }
    total
}

fn summarize(git: &Git, path: &Path, remote: &str) -> Result<RepoSummary, EngineError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let remotes = git.remote_names()?;
    let remote_url = match git.remote_url(remote)? {
        Some(url) => Some(url),
        None => match remotes.first() {
            Some(first) => git.remote_url(first)?,
            None => None,
        },
    };

    let span = git.head_time_span()?;
    let status = git.status_entries()?;
    let mut modified_files: Vec<String> = Vec::new();
    for entry in &status {
        if !modified_files.contains(&entry.path) {
            modified_files.push(entry.path.clone());
        }
    }

    Ok(RepoSummary {
        name,
        size_mb: dir_size(git.git_dir()) as f64 / (1024.0 * 1024.0),
        remote_url,
        commit_count: git.head_commit_count()?,
        first_commit: span.map(|(first, _)| first),
        last_commit: span.map(|(_, last)| last),
        is_clean: status.is_empty(),
        modified_files,
        branches: git
            .list_branches()?
            .into_iter()
            .map(|b| b.name.to_string())
            .collect(),
        current_branch: git.current_branch()?.map(|b| b.to_string()),
        remotes: group_remote_branches(&remotes, &git.remote_branch_refs()?),
        tags: git.list_tags()?.into_iter().map(|t| t.name).collect(),
        latest_stash: git.latest_stash(),
    })
}

impl Engine {
    /// Overview of the repository at `path`.
    pub fn summary(&self, path: &Path) -> Result<RepoSummary, EngineError> {
        let config = self.config(path)?;
        self.with_repo(path, "summary", |git| summarize(git, path, config.remote()))
    }

    /// Raw text of the working copy's README, if it has one.
    pub fn readme(&self, path: &Path) -> Result<Option<String>, EngineError> {
        self.with_repo(path, "readme", |git| {
            let root = git.work_dir()?;
            for name in README_NAMES {
                match fs::read(root.join(name)) {
                    Ok(data) => return Ok(Some(String::from_utf8_lossy(&data).into_owned())),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => tracing::warn!(file = name, error = %e, "unreadable README"),
                }
            }
            Ok(None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dir_size_counts_nested_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("top"), [0u8; 10]).unwrap();
        fs::write(temp.path().join("a/b/deep"), [0u8; 32]).unwrap();

        assert_eq!(dir_size(temp.path()), 42);
    }

    #[test]
    fn dir_size_of_missing_dir_is_zero() {
        let temp = TempDir::new().unwrap();
        assert_eq!(dir_size(&temp.path().join("missing")), 0);
    }

    #[test]
    fn empty_repository_summary() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::new();
        engine.init(temp.path()).unwrap();

        let summary = engine.summary(temp.path()).unwrap();
        assert_eq!(summary.commit_count, 0);
        assert!(summary.first_commit.is_none());
        assert!(summary.is_clean);
        assert!(summary.remote_url.is_none());
        assert!(summary.remotes.is_empty());
        assert!(summary.size_mb > 0.0);
    }

    #[test]
    fn readme_lookup() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::new();
        engine.init(temp.path()).unwrap();
        assert_eq!(engine.readme(temp.path()).unwrap(), None);

        fs::write(temp.path().join("README"), "hello").unwrap();
        assert_eq!(engine.readme(temp.path()).unwrap().as_deref(), Some("hello"));
    }
}
