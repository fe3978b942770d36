//! Integration tests for the Git interface.
//!
//! These tests build real repositories with the git CLI in temporary
//! directories and check what the git2-backed interface reads back.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use gitlane::core::types::{BranchName, Oid, RefName};
use gitlane::git::{Git, GitError, StatusEntry};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository on `main` with an initial commit.
    fn new() -> Self {
        let repo = Self::empty();
        repo.write("README.md", "# Test Repo\n");
        run_git(repo.path(), &["add", "README.md"]);
        run_git(repo.path(), &["commit", "-m", "Initial commit"]);
        repo
    }

    /// A repository without commits.
    fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    fn write(&self, file: &str, content: &str) {
        let full = self.path().join(file);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    /// Write, stage and commit a file, returning the new HEAD.
    fn commit_file(&self, file: &str, content: &str, message: &str) -> Oid {
        self.write(file, content);
        run_git(self.path(), &["add", file]);
        run_git(self.path(), &["commit", "-m", message]);
        self.git().head_oid().unwrap()
    }

    fn rev_parse(&self, rev: &str) -> String {
        git_stdout(self.path(), &["rev-parse", rev])
    }
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run a git command with extra environment variables.
fn run_git_env<K, V>(dir: &Path, args: &[&str], env: &[(K, V)])
where
    K: AsRef<std::ffi::OsStr>,
    V: AsRef<std::ffi::OsStr>,
{
    let output = Command::new("git")
        .args(args)
        .envs(env.iter().map(|(k, v)| (k, v)))
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn entry(path: &str, status: char, staged: bool) -> StatusEntry {
    StatusEntry {
        path: path.to_string(),
        status,
        staged,
    }
}

mod open {
    use super::*;

    #[test]
    fn plain_directory_is_not_a_repo() {
        let dir = TempDir::new().unwrap();
        let err = Git::open(dir.path()).unwrap_err();
        assert!(matches!(err, GitError::NotARepo { .. }));
        assert!(!Git::is_repo(dir.path()).unwrap());
    }

    #[test]
    fn init_creates_repo() {
        let dir = TempDir::new().unwrap();
        Git::init(dir.path()).unwrap();
        assert!(Git::is_repo(dir.path()).unwrap());
        assert!(dir.path().join(".git").is_dir());
    }

    #[test]
    fn work_dir_is_the_repo_root() {
        let repo = TestRepo::new();
        let git = repo.git();
        assert_eq!(
            git.work_dir().unwrap().canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
    }
}

mod status {
    use super::*;

    #[test]
    fn clean_repo_has_no_entries() {
        let repo = TestRepo::new();
        assert!(repo.git().status_entries().unwrap().is_empty());
        assert!(repo.git().is_worktree_clean().unwrap());
    }

    #[test]
    fn untracked_and_modified() {
        let repo = TestRepo::new();
        repo.write("new.txt", "new\n");
        repo.write("README.md", "# Changed\n");

        let mut entries = repo.git().status_entries().unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            entries,
            vec![entry("README.md", 'M', false), entry("new.txt", '?', false)]
        );
    }

    #[test]
    fn staged_and_unstaged_change_listed_twice() {
        let repo = TestRepo::new();
        repo.write("README.md", "one\n");
        run_git(repo.path(), &["add", "README.md"]);
        repo.write("README.md", "two\n");

        let entries = repo.git().status_entries().unwrap();
        assert!(entries.contains(&entry("README.md", 'M', true)));
        assert!(entries.contains(&entry("README.md", 'M', false)));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn staged_addition_and_deletion() {
        let repo = TestRepo::new();
        repo.write("added.txt", "a\n");
        run_git(repo.path(), &["add", "added.txt"]);
        run_git(repo.path(), &["rm", "-q", "README.md"]);

        let entries = repo.git().status_entries().unwrap();
        assert!(entries.contains(&entry("added.txt", 'A', true)));
        assert!(entries.contains(&entry("README.md", 'D', true)));
    }

    #[test]
    fn untracked_directories_are_recursed() {
        let repo = TestRepo::new();
        repo.write("dir/nested/file.txt", "x\n");

        let entries = repo.git().status_entries().unwrap();
        assert_eq!(entries, vec![entry("dir/nested/file.txt", '?', false)]);
    }

    #[test]
    fn deletion_state_tracks_both_sides() {
        let repo = TestRepo::new();
        std::fs::remove_file(repo.path().join("README.md")).unwrap();

        let state = repo.git().deletion_state("README.md").unwrap();
        assert!(state.worktree);
        assert!(!state.staged);

        run_git(repo.path(), &["rm", "-q", "--cached", "README.md"]);
        let state = repo.git().deletion_state("README.md").unwrap();
        assert!(state.staged);
    }
}

mod index {
    use super::*;

    #[test]
    fn stage_then_unstage_path() {
        let repo = TestRepo::new();
        repo.write("README.md", "changed\n");
        let git = repo.git();

        git.stage_path("README.md").unwrap();
        assert_eq!(git.status_entries().unwrap(), vec![entry("README.md", 'M', true)]);

        git.unstage_path("README.md").unwrap();
        assert_eq!(git.status_entries().unwrap(), vec![entry("README.md", 'M', false)]);
    }

    #[test]
    fn staging_missing_file_stages_deletion() {
        let repo = TestRepo::new();
        std::fs::remove_file(repo.path().join("README.md")).unwrap();

        repo.git().stage_path("README.md").unwrap();
        assert_eq!(
            repo.git().status_entries().unwrap(),
            vec![entry("README.md", 'D', true)]
        );
    }

    #[test]
    fn stage_all_includes_untracked_and_deleted() {
        let repo = TestRepo::new();
        repo.commit_file("gone.txt", "bye\n", "Add gone");
        std::fs::remove_file(repo.path().join("gone.txt")).unwrap();
        repo.write("fresh.txt", "hi\n");
        repo.write("README.md", "edited\n");

        let git = repo.git();
        git.stage_all().unwrap();
        let entries = git.status_entries().unwrap();
        assert!(entries.iter().all(|e| e.staged));
        assert_eq!(entries.len(), 3);

        git.unstage_all().unwrap();
        let entries = git.status_entries().unwrap();
        assert!(entries.iter().all(|e| !e.staged));
        assert!(entries.contains(&entry("fresh.txt", '?', false)));
    }

    #[test]
    fn unstage_without_commits_is_no_head() {
        let repo = TestRepo::empty();
        repo.write("a.txt", "a\n");
        let git = repo.git();
        git.stage_path("a.txt").unwrap();

        assert!(matches!(git.unstage_path("a.txt"), Err(GitError::NoHead)));
    }

    #[test]
    fn contents_of_each_side() {
        let repo = TestRepo::new();
        repo.write("README.md", "staged\n");
        run_git(repo.path(), &["add", "README.md"]);
        repo.write("README.md", "worktree\n");

        let git = repo.git();
        assert_eq!(git.head_content("README.md").unwrap().unwrap(), b"# Test Repo\n");
        assert_eq!(git.index_content("README.md").unwrap().unwrap(), b"staged\n");
        assert_eq!(git.worktree_content("README.md").unwrap().unwrap(), b"worktree\n");
        assert_eq!(git.head_content("missing.txt").unwrap(), None);
        assert_eq!(git.worktree_content("missing.txt").unwrap(), None);
    }
}

mod commits {
    use super::*;

    #[test]
    fn commit_index_creates_child_of_head() {
        let repo = TestRepo::new();
        let parent = repo.git().head_oid().unwrap();
        repo.write("file.txt", "content\n");
        run_git(repo.path(), &["add", "file.txt"]);

        let git = repo.git();
        let oid = git.commit_index("Add file\n\nWith body", false, None).unwrap();
        assert_eq!(oid.as_str(), repo.rev_parse("HEAD"));

        let info = git.commit_info(&oid).unwrap();
        assert_eq!(info.parents, vec![parent]);
        assert_eq!(info.summary, "Add file");
        assert_eq!(info.author_name, "Test User");
        assert_eq!(info.author_email, "test@example.com");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_message_and_author_are_decoded_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let repo = TestRepo::new();
        repo.write("file.txt", "content\n");
        run_git(repo.path(), &["add", "file.txt"]);
        let message = repo.path().join(".git/latin1-message");
        std::fs::write(&message, b"Caf\xe9 opens\n\nMen\xfa of the day\n").unwrap();
        run_git_env(
            repo.path(),
            &["commit", "-q", "-F", message.to_str().unwrap()],
            &[(OsStr::new("GIT_AUTHOR_NAME"), OsStr::from_bytes(b"Jos\xe9"))],
        );

        let git = repo.git();
        let info = git.commit_info(&git.head_oid().unwrap()).unwrap();
        assert_eq!(info.summary, "Caf\u{fffd} opens");
        assert!(info.message.contains("Men\u{fffd} of the day"), "{}", info.message);
        assert_eq!(info.author_name, "Jos\u{fffd}");
        assert_eq!(info.author_email, "test@example.com");
    }

    #[test]
    fn nothing_staged_is_nothing_to_commit() {
        let repo = TestRepo::new();
        let err = repo.git().commit_index("Empty", false, None).unwrap_err();
        assert!(matches!(err, GitError::NothingToCommit));
    }

    #[test]
    fn amend_replaces_head() {
        let repo = TestRepo::new();
        let first = repo.commit_file("a.txt", "a\n", "Add a");
        let root = repo.rev_parse("HEAD~1");

        let git = repo.git();
        let amended = git.commit_index("Add a, reworded", true, None).unwrap();
        assert_ne!(amended, first);

        let info = git.commit_info(&amended).unwrap();
        assert_eq!(info.summary, "Add a, reworded");
        assert_eq!(info.parents.len(), 1);
        assert_eq!(info.parents[0].as_str(), root);
    }

    #[test]
    fn first_commit_in_empty_repo() {
        let repo = TestRepo::empty();
        repo.write("a.txt", "a\n");
        let git = repo.git();
        git.stage_path("a.txt").unwrap();

        let oid = git.commit_index("Root", false, None).unwrap();
        assert!(git.commit_info(&oid).unwrap().parents.is_empty());
    }

    #[test]
    fn commit_changes_against_first_parent() {
        let repo = TestRepo::new();
        repo.write("added.txt", "new\n");
        repo.write("README.md", "changed\n");
        run_git(repo.path(), &["add", "-A"]);
        run_git(repo.path(), &["commit", "-m", "Mixed"]);
        run_git(repo.path(), &["rm", "-q", "added.txt"]);
        run_git(repo.path(), &["commit", "-m", "Remove"]);

        let git = repo.git();
        let mixed = git.resolve_commit("HEAD~1").unwrap();
        let mut changes = git.commit_changes(&mixed).unwrap();
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        let summary: Vec<_> = changes.iter().map(|c| (c.path.as_str(), c.status)).collect();
        assert_eq!(summary, vec![("README.md", 'M'), ("added.txt", 'A')]);

        let head = git.head_oid().unwrap();
        let changes = git.commit_changes(&head).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].status, 'D');
    }

    #[test]
    fn root_commit_lists_every_file_as_added() {
        let repo = TestRepo::new();
        let git = repo.git();
        let root = git.head_oid().unwrap();
        let changes = git.commit_changes(&root).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "README.md");
        assert_eq!(changes[0].status, 'A');
    }

    #[test]
    fn file_contents_at_commit_and_parent() {
        let repo = TestRepo::new();
        let oid = repo.commit_file("README.md", "# Second\n", "Edit");

        let (old, new) = repo.git().commit_file_contents(&oid, "README.md").unwrap();
        assert_eq!(old.unwrap(), b"# Test Repo\n");
        assert_eq!(new.unwrap(), b"# Second\n");
    }

    #[test]
    fn resolve_short_hash_and_branch() {
        let repo = TestRepo::new();
        let git = repo.git();
        let head = git.head_oid().unwrap();

        assert_eq!(git.resolve_commit(head.short(8)).unwrap(), head);
        assert_eq!(git.resolve_commit("main").unwrap(), head);
        assert!(git.resolve_commit("no-such-rev").is_err());
    }

    #[test]
    fn walk_is_newest_first_and_limited() {
        let repo = TestRepo::new();
        repo.commit_file("a.txt", "a\n", "A");
        repo.commit_file("b.txt", "b\n", "B");

        let git = repo.git();
        let all = git.walk_commits(None).unwrap();
        let subjects: Vec<_> = all.iter().map(|c| c.summary.as_str()).collect();
        assert_eq!(subjects, vec!["B", "A", "Initial commit"]);

        assert_eq!(git.walk_commits(Some(2)).unwrap().len(), 2);
        assert_eq!(git.head_commit_count().unwrap(), 3);
    }

    #[test]
    fn walk_of_empty_repo_is_empty() {
        let repo = TestRepo::empty();
        assert!(repo.git().walk_commits(None).unwrap().is_empty());
        assert!(repo.git().head_time_span().unwrap().is_none());
    }

    #[test]
    fn time_span_runs_from_root_to_head() {
        let repo = TestRepo::empty();
        for (i, secs) in [1_600_000_000, 1_650_000_000, 1_700_000_000].iter().enumerate() {
            let date = format!("@{secs} +0000");
            repo.write("n.txt", &format!("{i}\n"));
            run_git(repo.path(), &["add", "n.txt"]);
            run_git_env(
                repo.path(),
                &["commit", "-q", "-m", "step"],
                &[("GIT_AUTHOR_DATE", date.as_str()), ("GIT_COMMITTER_DATE", date.as_str())],
            );
        }

        let (oldest, newest) = repo.git().head_time_span().unwrap().unwrap();
        assert_eq!(oldest.timestamp(), 1_600_000_000);
        assert_eq!(newest.timestamp(), 1_700_000_000);
    }

    #[test]
    fn walk_includes_commits_only_on_other_branches() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["checkout", "-q", "-b", "side"]);
        repo.commit_file("side.txt", "s\n", "Side work");
        run_git(repo.path(), &["checkout", "-q", "main"]);

        let subjects: Vec<_> = repo
            .git()
            .walk_commits(None)
            .unwrap()
            .into_iter()
            .map(|c| c.summary)
            .collect();
        assert!(subjects.contains(&"Side work".to_string()));
    }
}

mod refs {
    use super::*;

    #[test]
    fn current_branch_and_detached_head() {
        let repo = TestRepo::new();
        assert_eq!(repo.git().current_branch().unwrap().unwrap().as_str(), "main");

        let head = repo.rev_parse("HEAD");
        run_git(repo.path(), &["checkout", "-q", &head]);
        assert_eq!(repo.git().current_branch().unwrap(), None);
    }

    #[test]
    fn unborn_branch_is_reported() {
        let repo = TestRepo::empty();
        assert_eq!(repo.git().current_branch().unwrap().unwrap().as_str(), "main");
    }

    #[test]
    fn list_branches_sorted_with_current() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["branch", "feature/x"]);
        run_git(repo.path(), &["branch", "alpha"]);

        let branches = repo.git().list_branches().unwrap();
        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "feature/x", "main"]);
        let current: Vec<_> = branches.iter().filter(|b| b.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name.as_str(), "main");
    }

    #[test]
    fn create_checkout_delete_branch() {
        let repo = TestRepo::new();
        let git = repo.git();
        let name = BranchName::new("topic").unwrap();

        let oid = git.create_branch(&name, None).unwrap();
        assert_eq!(oid, git.head_oid().unwrap());
        assert!(git.branch_exists(&name));
        assert!(matches!(
            git.create_branch(&name, None),
            Err(GitError::AlreadyExists { .. })
        ));

        git.checkout_branch(&name).unwrap();
        assert_eq!(git.current_branch().unwrap().unwrap(), name);

        git.checkout_branch(&BranchName::new("main").unwrap()).unwrap();
        git.delete_branch(&name).unwrap();
        assert!(!git.branch_exists(&name));
    }

    #[test]
    fn branch_at_start_point() {
        let repo = TestRepo::new();
        let root = repo.rev_parse("HEAD");
        repo.commit_file("a.txt", "a\n", "A");

        let git = repo.git();
        let oid = git
            .create_branch(&BranchName::new("old").unwrap(), Some("HEAD~1"))
            .unwrap();
        assert_eq!(oid.as_str(), root);
    }

    #[test]
    fn checkout_refuses_to_overwrite_local_changes() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["checkout", "-q", "-b", "other"]);
        repo.commit_file("README.md", "# Other\n", "Other readme");
        run_git(repo.path(), &["checkout", "-q", "main"]);
        repo.write("README.md", "# Local edit\n");

        let err = repo
            .git()
            .checkout_branch(&BranchName::new("other").unwrap())
            .unwrap_err();
        assert!(matches!(err, GitError::CheckoutConflict { .. }));
        assert_eq!(
            std::fs::read_to_string(repo.path().join("README.md")).unwrap(),
            "# Local edit\n"
        );
    }

    #[test]
    fn lightweight_and_annotated_tags() {
        let repo = TestRepo::new();
        let git = repo.git();
        let head = git.head_oid().unwrap();

        git.create_tag("v1", None, None, None).unwrap();
        git.create_tag("v2", Some("Release 2"), None, None).unwrap();

        let tags = git.list_tags().unwrap();
        let v1 = tags.iter().find(|t| t.name == "v1").unwrap();
        let v2 = tags.iter().find(|t| t.name == "v2").unwrap();
        assert!(!v1.annotated);
        assert!(v2.annotated);
        assert_eq!(v1.target, head);
        assert_eq!(v2.target, head);

        assert_eq!(git_stdout(repo.path(), &["cat-file", "-t", "v2"]), "tag");
        assert!(matches!(
            git.create_tag("v1", None, None, None),
            Err(GitError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn ref_targets_include_head_branches_and_peeled_tags() {
        let repo = TestRepo::new();
        let git = repo.git();
        let head = git.head_oid().unwrap();
        git.create_tag("v1", Some("annotated"), None, None).unwrap();

        let targets = git.ref_targets();
        assert!(targets.contains(&("HEAD".to_string(), head.clone())));
        assert!(targets.contains(&("main".to_string(), head.clone())));
        assert!(targets.contains(&("v1".to_string(), head)));
    }

    #[test]
    fn remote_tracking_refs_skip_symbolic_head() {
        let remote = TestRepo::new();
        run_git(remote.path(), &["branch", "feature"]);

        let clone_dir = TempDir::new().unwrap();
        run_git(
            clone_dir.path(),
            &["clone", "-q", remote.path().to_str().unwrap(), "work"],
        );
        let work = clone_dir.path().join("work");
        let git = Git::open(&work).unwrap();

        let mut names: Vec<_> = git
            .remote_branch_refs()
            .unwrap()
            .iter()
            .map(RefName::short)
            .collect();
        names.sort();
        assert_eq!(names, vec!["origin/feature", "origin/main"]);
        assert_eq!(git.remote_names().unwrap(), vec!["origin"]);
        assert!(git.remote_url("origin").unwrap().is_some());
        assert_eq!(git.remote_url("upstream").unwrap(), None);
    }

    #[test]
    fn tracking_branch_from_remote() {
        let remote = TestRepo::new();
        run_git(remote.path(), &["branch", "feature"]);
        let clone_dir = TempDir::new().unwrap();
        run_git(
            clone_dir.path(),
            &["clone", "-q", remote.path().to_str().unwrap(), "work"],
        );
        let git = Git::open(&clone_dir.path().join("work")).unwrap();

        let remote_ref = RefName::parse("refs/remotes/origin/feature").unwrap();
        let local = git.create_tracking_branch(&remote_ref).unwrap();
        assert_eq!(local.as_str(), "feature");

        let info = git
            .list_branches()
            .unwrap()
            .into_iter()
            .find(|b| b.name == local)
            .unwrap();
        assert_eq!(info.upstream.as_deref(), Some("origin/feature"));
    }

    #[test]
    fn latest_stash_message() {
        let repo = TestRepo::new();
        assert_eq!(repo.git().latest_stash(), None);

        repo.write("README.md", "stashed\n");
        run_git(repo.path(), &["stash", "push", "-q", "-m", "wip readme"]);
        let stash = repo.git().latest_stash().unwrap();
        assert!(stash.contains("wip readme"), "{stash}");
    }
}
