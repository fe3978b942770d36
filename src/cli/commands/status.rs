//! status command - Show staged and unstaged changes

use crate::cli::Context;
use crate::engine::Engine;
use crate::git::StatusEntry;
use crate::ui::output;
use anyhow::{Context as _, Result};

fn section(title: &str, entries: &[&StatusEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|e| format!("{} {}", e.status, e.path))
        .collect();
    Some(format!("{title}:\n{}", output::format_list(&lines, "  ")))
}

/// Show staged and unstaged changes.
pub fn status(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    let entries = engine
        .status(&path)
        .context("Failed to read repository status")?;

    if ctx.json {
        return Ok(output::json(&entries)?);
    }

    if entries.is_empty() {
        output::print("Nothing to commit, working tree clean.", ctx.verbosity());
        return Ok(());
    }

    let (staged, unstaged): (Vec<&StatusEntry>, Vec<&StatusEntry>) =
        entries.iter().partition(|e| e.staged);
    let sections: Vec<String> = [
        section("Staged", &staged),
        section("Not staged", &unstaged),
    ]
    .into_iter()
    .flatten()
    .collect();

    // The listing itself is the result, so it ignores quiet mode.
    println!("{}", sections.join("\n\n"));
    Ok(())
}
