//! core::history
//!
//! Commit History Assembler.
//!
//! # Architecture
//!
//! [`assemble`] asks the git accessor for two things: the resolved target of
//! every reference, and the commits reachable from HEAD and every ref tip in
//! committer-time order. It then joins them into [`CommitRecord`]s. The join
//! itself ([`build_records`]) is pure so it can be tested without a
//! repository.
//!
//! # Invariants
//!
//! - `refs` of a record lists every ref name whose peeled target is that
//!   commit (annotated tags land on the commit, never on the tag object)
//! - `refs` is never absent; commits without refs carry an empty list
//! - A repository without commits produces an empty history
//! - Unresolvable refs are skipped by the accessor, never surfaced

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::Oid;
use crate::git::{CommitInfo, Git, GitError};

/// One row of the history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: Oid,
    /// Parent hashes in commit order; the first is the primary parent.
    pub parent_hashes: Vec<Oid>,
    pub author_name: String,
    pub author_email: String,
    /// Author timestamp.
    pub date: DateTime<Utc>,
    /// Committer timestamp; history is ordered by this.
    pub commit_time: DateTime<Utc>,
    pub subject: String,
    pub body: String,
    pub refs: Vec<String>,
}

impl CommitRecord {
    /// The primary parent, if any.
    pub fn first_parent(&self) -> Option<&Oid> {
        self.parent_hashes.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_hashes.len() > 1
    }
}

/// Split a raw commit message into subject and body.
///
/// The subject is everything before the first newline. The body is the
/// rest with surrounding whitespace trimmed, or empty when there is no
/// second line.
pub fn split_message(message: &str) -> (String, String) {
    match message.split_once('\n') {
        Some((subject, rest)) => (subject.to_string(), rest.trim().to_string()),
        None => (message.to_string(), String::new()),
    }
}

/// Join walked commits with the ref map.
///
/// `ref_targets` pairs short ref names with the commit they resolve to, in
/// enumeration order. Names keep that order within each record.
pub fn build_records(commits: Vec<CommitInfo>, ref_targets: &[(String, Oid)]) -> Vec<CommitRecord> {
    let mut ref_map: HashMap<&Oid, Vec<String>> = HashMap::new();
    for (name, oid) in ref_targets {
        ref_map.entry(oid).or_default().push(name.clone());
    }

    commits
        .into_iter()
        .map(|commit| {
            let (subject, body) = split_message(&commit.message);
            let refs = ref_map.get(&commit.oid).cloned().unwrap_or_default();
            CommitRecord {
                hash: commit.oid,
                parent_hashes: commit.parents,
                author_name: commit.author_name,
                author_email: commit.author_email,
                date: commit.author_time,
                commit_time: commit.commit_time,
                subject,
                body,
                refs,
            }
        })
        .collect()
}

/// Assemble the commit history of a repository, newest first.
///
/// `max_count <= 0` means unbounded.
///
/// # Errors
///
/// Only failures to start the walk itself are returned; an empty
/// repository is not an error.
pub fn assemble(git: &Git, max_count: i64) -> Result<Vec<CommitRecord>, GitError> {
    let limit = usize::try_from(max_count).ok().filter(|n| *n > 0);

    let ref_targets = git.ref_targets();
    let commits = git.walk_commits(limit)?;

    tracing::debug!(
        commits = commits.len(),
        refs = ref_targets.len(),
        "assembled history"
    );
    Ok(build_records(commits, &ref_targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u32) -> Oid {
        Oid::new(format!("{n:040x}")).unwrap()
    }

    fn info(n: u32, parents: &[u32], message: &str) -> CommitInfo {
        let time = DateTime::from_timestamp(1_700_000_000 + i64::from(n), 0).unwrap();
        CommitInfo {
            oid: oid(n),
            parents: parents.iter().map(|p| oid(*p)).collect(),
            summary: message.lines().next().unwrap_or("").to_string(),
            message: message.to_string(),
            author_name: "Test".to_string(),
            author_email: "test@example.com".to_string(),
            author_time: time,
            commit_time: time,
        }
    }

    mod split {
        use super::*;

        #[test]
        fn subject_only() {
            assert_eq!(
                split_message("Fix bug"),
                ("Fix bug".to_string(), String::new())
            );
        }

        #[test]
        fn subject_and_body() {
            let (subject, body) = split_message("Add thing\n\n  Longer text.\nMore.\n\n");
            assert_eq!(subject, "Add thing");
            assert_eq!(body, "Longer text.\nMore.");
        }

        #[test]
        fn trailing_newline_only() {
            assert_eq!(
                split_message("Subject\n"),
                ("Subject".to_string(), String::new())
            );
        }
    }

    mod records {
        use super::*;

        #[test]
        fn refs_attach_to_resolved_commit() {
            let commits = vec![info(3, &[2], "three"), info(2, &[1], "two"), info(1, &[], "one")];
            let refs = vec![
                ("HEAD".to_string(), oid(3)),
                ("main".to_string(), oid(3)),
                ("v1.0".to_string(), oid(1)),
            ];

            let records = build_records(commits, &refs);

            assert_eq!(records[0].refs, vec!["HEAD", "main"]);
            assert!(records[1].refs.is_empty());
            assert_eq!(records[2].refs, vec!["v1.0"]);
        }

        #[test]
        fn parents_keep_order() {
            let records = build_records(vec![info(5, &[4, 3], "Merge")], &[]);
            assert_eq!(records[0].parent_hashes, vec![oid(4), oid(3)]);
            assert_eq!(records[0].first_parent(), Some(&oid(4)));
            assert!(records[0].is_merge());
        }

        #[test]
        fn serializes_camel_case() {
            let records = build_records(vec![info(1, &[], "one")], &[]);
            let json = serde_json::to_value(&records[0]).unwrap();
            assert!(json.get("parentHashes").is_some());
            assert!(json.get("authorEmail").is_some());
            assert_eq!(json["refs"], serde_json::json!([]));
        }
    }
}
