//! gitlane - the repository core of a desktop git client
//!
//! gitlane exposes version-control operations over local working copies:
//! status, staging, commits, branches and tags, fetch/pull/push and history
//! browsing with a laid-out commit graph. A GUI front end calls into
//! [`engine::Engine`]; the `gitlane` binary is a thin command-line front end
//! over the same surface.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Request surface; gates every call per repository
//! - [`core`] - Domain types, diff synthesis, history and graph layout
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! 1. At most one operation runs against a working copy at a time
//! 2. Diff hunks carry no context lines and exact line numbers
//! 3. The graph layout is a pure function of the commit list
//! 4. Mutations check their preconditions before changing repository state

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
