//! ui
//!
//! User-facing output for the command-line front end.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output goes through this module so that quiet mode and
//! JSON mode behave the same for every command.

pub mod output;
