//! core::ops
//!
//! Coordination of operations against a working copy.
//!
//! # Modules
//!
//! - [`lock`] - Per-repository lock registry
//!
//! # Architecture
//!
//! Every engine call:
//! 1. Acquires the repository's guard from the shared registry
//! 2. Opens the repository through the git accessor
//! 3. Performs its reads or writes
//! 4. Drops the guard on return, error or panic

pub mod lock;

pub use lock::{LockRegistry, RepoGuard};
