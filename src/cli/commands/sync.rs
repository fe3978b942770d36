//! fetch, pull and push commands - Talk to the configured remote
//!
//! Progress lines go to stderr as the transfer runs.

use crate::cli::Context;
use crate::engine::Engine;
use crate::git::PullOutcome;
use crate::ui::output;
use anyhow::Result;

/// Fetch the configured remote.
pub fn fetch(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    engine.fetch(&path, &ctx.progress_sink())?;
    Ok(())
}

/// Fetch and fast-forward the current branch.
pub fn pull(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    match engine.pull(&path, &ctx.progress_sink())? {
        PullOutcome::UpToDate => output::print("Already up to date.", ctx.verbosity()),
        PullOutcome::FastForwarded { from, to } => {
            let from = from.as_ref().map_or("(none)", |oid| oid.short(7));
            output::print(
                format!("Fast-forwarded {}..{}", from, to.short(7)),
                ctx.verbosity(),
            );
        }
    }
    Ok(())
}

/// Push the current branch.
pub fn push(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    engine.push(&path, &ctx.progress_sink())?;
    Ok(())
}
