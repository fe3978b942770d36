//! stash command - Save, list, drop and pop stashed changes

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Stash the changes of `files`.
pub fn save(engine: &Engine, ctx: &Context, files: &[String], message: Option<&str>) -> Result<()> {
    let path = ctx.repo_path()?;
    if let Some(oid) = engine
        .stash_save(&path, files, message)
        .context("Failed to stash changes")?
    {
        output::print(
            format!("Stashed {} file(s) as {}", files.len(), oid.short(7)),
            ctx.verbosity(),
        );
    }
    Ok(())
}

/// List stash entries as `stash@{n}: message`.
pub fn list(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    let entries = engine.stashes(&path).context("Failed to list stashes")?;

    if ctx.json {
        return Ok(output::json(&entries)?);
    }
    if entries.is_empty() {
        output::print("No stash entries.", ctx.verbosity());
        return Ok(());
    }
    for entry in &entries {
        println!("stash@{{{}}}: {}", entry.index, entry.message);
    }
    Ok(())
}

pub fn drop(engine: &Engine, ctx: &Context, index: usize) -> Result<()> {
    let path = ctx.repo_path()?;
    engine
        .stash_drop(&path, index)
        .with_context(|| format!("Failed to drop stash@{{{index}}}"))?;
    output::print(format!("Dropped stash@{{{index}}}"), ctx.verbosity());
    Ok(())
}

pub fn pop(engine: &Engine, ctx: &Context, index: usize) -> Result<()> {
    let path = ctx.repo_path()?;
    engine
        .stash_pop(&path, index)
        .with_context(|| format!("Failed to pop stash@{{{index}}}"))?;
    output::print(format!("Restored stash@{{{index}}}"), ctx.verbosity());
    Ok(())
}
