//! init command - Create an empty repository

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create an empty repository in the working directory.
///
/// An existing repository is left alone.
pub fn init(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;

    if engine.is_repo(&path)? {
        output::print(
            format!("{} is already a repository.", path.display()),
            ctx.verbosity(),
        );
        return Ok(());
    }

    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    engine.init(&path).context("Failed to initialize repository")?;
    output::print(
        format!("Initialized empty repository in {}", path.display()),
        ctx.verbosity(),
    );
    Ok(())
}
