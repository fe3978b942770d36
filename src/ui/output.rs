//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout, everything else (progress, warnings, errors) to
//! stderr, so `--json` output can be piped. Quiet mode suppresses all
//! non-essential output.

use std::fmt::Display;

use serde::Serialize;

use crate::engine::Progress;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a value as pretty JSON on stdout.
pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One progress event as a stderr line.
pub fn format_progress(event: &Progress) -> String {
    if event.is_failure() {
        event.status.clone()
    } else {
        format!("[{:>3}%] {}", event.percent, event.status)
    }
}

/// Print a progress event (respects quiet mode).
pub fn progress(event: &Progress, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", format_progress(event));
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn progress_lines() {
        assert_eq!(
            format_progress(&Progress::new("Fetching origin...", 0)),
            "[  0%] Fetching origin..."
        );
        assert_eq!(
            format_progress(&Progress::new("Fetch failed: SSH key not found", -1)),
            "Fetch failed: SSH key not found"
        );
    }

    #[test]
    fn list_with_prefix() {
        assert_eq!(format_list(&["a", "b"], "  "), "  a\n  b");
        assert_eq!(format_list::<&str>(&[], "  "), "");
    }
}
