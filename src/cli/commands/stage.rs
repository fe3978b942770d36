//! stage, unstage and discard commands - Edit the index and worktree

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Stage files, or every change with `all`.
pub fn stage(engine: &Engine, ctx: &Context, files: &[String], all: bool) -> Result<()> {
    let path = ctx.repo_path()?;

    if all {
        engine.stage_all(&path).context("Failed to stage changes")?;
        output::print("Staged all changes.", ctx.verbosity());
        return Ok(());
    }

    for file in files {
        engine
            .stage_file(&path, file)
            .with_context(|| format!("Failed to stage {file}"))?;
        output::print(format!("Staged {file}"), ctx.verbosity());
    }
    Ok(())
}

/// Unstage files, or the whole index with `all`.
pub fn unstage(engine: &Engine, ctx: &Context, files: &[String], all: bool) -> Result<()> {
    let path = ctx.repo_path()?;

    if all {
        engine.unstage_all(&path).context("Failed to unstage changes")?;
        output::print("Unstaged all changes.", ctx.verbosity());
        return Ok(());
    }

    for file in files {
        engine
            .unstage_file(&path, file)
            .with_context(|| format!("Failed to unstage {file}"))?;
        output::print(format!("Unstaged {file}"), ctx.verbosity());
    }
    Ok(())
}

/// Restore tracked files from the index and delete untracked ones.
pub fn discard(engine: &Engine, ctx: &Context, files: &[String]) -> Result<()> {
    let path = ctx.repo_path()?;
    engine
        .discard_changes(&path, files)
        .context("Failed to discard changes")?;
    for file in files {
        output::print(format!("Discarded {file}"), ctx.verbosity());
    }
    Ok(())
}
