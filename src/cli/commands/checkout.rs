//! checkout command - Check out a branch

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Check out a local branch, or a remote branch through its local
/// tracking branch.
pub fn checkout(engine: &Engine, ctx: &Context, name: &str, remote: bool) -> Result<()> {
    let path = ctx.repo_path()?;
    engine
        .checkout(&path, name, remote)
        .with_context(|| format!("Failed to check out '{name}'"))?;
    output::print(format!("Switched to '{name}'"), ctx.verbosity());
    Ok(())
}
