//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gitlane - the repository core of a desktop git client, from the shell
#[derive(Parser, Debug)]
#[command(name = "gitlane")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gitlane was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; progress is not shown
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty repository in the working directory
    Init,

    /// Show staged and unstaged changes
    #[command(
        long_about = "Show staged and unstaged changes.\n\n\
            Each line is a status letter and a path. A file with both staged and \
            unstaged changes is listed twice. Letters: M modified, A added, \
            D deleted, R renamed, C copied, U conflicted, ? untracked."
    )]
    Status,

    /// Stage files for the next commit
    Stage {
        /// Files to stage; a file missing on disk stages its deletion
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        files: Vec<String>,

        /// Stage every change, including untracked files
        #[arg(long, short)]
        all: bool,
    },

    /// Remove files from the index, keeping the worktree
    Unstage {
        /// Files to unstage
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        files: Vec<String>,

        /// Unstage everything
        #[arg(long, short)]
        all: bool,
    },

    /// Throw away worktree changes
    #[command(
        long_about = "Throw away worktree changes.\n\n\
            Tracked files are restored from the index, so staged changes are kept. \
            Untracked files are deleted."
    )]
    Discard {
        /// Files to restore or delete
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Save, list, drop or pop stashed changes
    Stash {
        #[command(subcommand)]
        action: StashAction,
    },

    /// Show the changes of one file
    #[command(
        long_about = "Show the changes of one file as hunks without context lines.\n\n\
            Without --staged the file on disk is compared with the index; with \
            --staged the index is compared with HEAD.",
        after_help = "\
EXAMPLES:
    # Unstaged changes
    gitlane diff src/main.rs

    # What the next commit will contain
    gitlane diff src/main.rs --staged"
    )]
    Diff {
        /// File to diff, relative to the repository root
        file: String,

        /// Compare the index with HEAD instead of the worktree with the index
        #[arg(long)]
        staged: bool,
    },

    /// Commit the staged changes
    Commit {
        /// Commit subject line
        #[arg(short = 'm', long = "message")]
        subject: String,

        /// Commit body, separated from the subject by a blank line
        #[arg(short, long, default_value = "")]
        body: String,

        /// Replace the last commit instead of adding a new one
        #[arg(long)]
        amend: bool,
    },

    /// Show commit history
    #[command(
        after_help = "\
EXAMPLES:
    # Latest commits (history_limit from config, default 500)
    gitlane log

    # The last 20 commits with the lane graph
    gitlane log -n 20 --graph

    # Everything
    gitlane log -n 0"
    )]
    Log {
        /// Number of commits to show; 0 shows all
        #[arg(short = 'n', long)]
        count: Option<i64>,

        /// Draw the commit graph
        #[arg(long)]
        graph: bool,
    },

    /// Show the files a commit changed, or the diff of one of them
    Show {
        /// Commit hash or revision
        hash: String,

        /// Show this file's diff against the first parent
        file: Option<String>,
    },

    /// List, create or delete branches
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Check out a branch
    #[command(
        long_about = "Check out a branch.\n\n\
            With --remote, NAME is a remote branch such as origin/feature. The local \
            branch feature is checked out, and created to track the remote branch \
            if it does not exist yet. Local changes that would be overwritten abort \
            the checkout."
    )]
    Checkout {
        /// Branch name
        name: String,

        /// NAME is a remote-tracking branch
        #[arg(long)]
        remote: bool,
    },

    /// Create a tag
    Tag {
        /// Tag name
        name: String,

        /// Annotation message; without it the tag is lightweight
        #[arg(short, long)]
        message: Option<String>,

        /// Revision to tag (default HEAD)
        #[arg(long)]
        target: Option<String>,

        /// Push the new tag to the configured remote
        #[arg(long, conflicts_with = "push_all")]
        push: bool,

        /// Push every local tag to the configured remote
        #[arg(long)]
        push_all: bool,
    },

    /// Download objects and refs from the configured remote
    Fetch,

    /// Fetch and fast-forward the current branch
    Pull,

    /// Push the current branch to the configured remote
    Push,

    /// Show an overview of the repository
    Summary,

    /// Get, set, or list configuration values
    #[command(
        after_help = "\
KEYS:
    remote             Remote used by fetch, pull and push (repo or global)
    history_limit      Commits loaded by log; 0 loads all (repo or global)
    ssh_key            Private key for SSH remotes (global)
    identity.name      Fallback commit identity (global)
    identity.email     Fallback commit identity (global)
    graph.row_height   Graph row height (global)
    graph.lane_width   Graph lane width (global)"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum BranchAction {
    /// List branches
    List {
        /// List remote-tracking branches grouped by remote
        #[arg(long, conflicts_with = "tree")]
        remote: bool,

        /// Group local branches into folders by `/`
        #[arg(long)]
        tree: bool,
    },
    /// Create a branch
    Create {
        /// Branch name
        name: String,

        /// Start point (default HEAD)
        #[arg(long)]
        from: Option<String>,

        /// Check out the new branch
        #[arg(long)]
        checkout: bool,
    },
    /// Delete a branch
    Delete {
        /// Branch name
        name: String,

        /// Also delete the branch on the configured remote
        #[arg(long)]
        remote: bool,
    },
}

/// Stash subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum StashAction {
    /// Stash the changes of some files, keeping all other changes
    Save {
        /// Files to stash
        #[arg(required = true)]
        files: Vec<String>,

        /// Stash message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List stash entries, most recent first
    List,
    /// Remove a stash entry without applying it
    Drop {
        /// Entry to drop (0 is the most recent)
        #[arg(default_value_t = 0)]
        index: usize,
    },
    /// Apply a stash entry and remove it
    Pop {
        /// Entry to pop (0 is the most recent)
        #[arg(default_value_t = 0)]
        index: usize,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,

        /// Write to the global config even for repo-level keys
        #[arg(long)]
        global: bool,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stage_requires_files_or_all() {
        assert!(Cli::try_parse_from(["gitlane", "stage"]).is_err());
        assert!(Cli::try_parse_from(["gitlane", "stage", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["gitlane", "stage", "a", "--all"]).is_err());
    }

    #[test]
    fn tag_push_flags_conflict() {
        assert!(Cli::try_parse_from(["gitlane", "tag", "v1", "--push"]).is_ok());
        assert!(Cli::try_parse_from(["gitlane", "tag", "v1", "--push", "--push-all"]).is_err());
    }

    #[test]
    fn stash_index_defaults_to_latest() {
        let cli = Cli::try_parse_from(["gitlane", "stash", "pop"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Stash {
                action: StashAction::Pop { index: 0 }
            }
        ));
        assert!(Cli::try_parse_from(["gitlane", "stash", "save"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitlane", "status", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    #[test]
    fn commit_body_defaults_empty() {
        let cli = Cli::try_parse_from(["gitlane", "commit", "-m", "subject"]).unwrap();
        match cli.command {
            Command::Commit { subject, body, amend } => {
                assert_eq!(subject, "subject");
                assert_eq!(body, "");
                assert!(!amend);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
