//! core
//!
//! Domain types and the pure algorithms of the client core.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, BranchName, RefName
//! - [`diff`] - Diff synthesis from two full texts
//! - [`history`] - Commit history assembly
//! - [`graph`] - Commit graph lane layout
//! - [`branch_tree`] - Branch names grouped by path segment
//! - [`ops`] - Per-repository locking
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - The algorithms here are deterministic and never touch the network
//! - Only [`history`] reads from a repository, and only through [`crate::git`]

pub mod branch_tree;
pub mod config;
pub mod diff;
pub mod graph;
pub mod history;
pub mod ops;
pub mod types;
