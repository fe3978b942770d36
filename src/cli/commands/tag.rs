//! tag command - Create a tag, optionally pushing it

use crate::cli::Context;
use crate::engine::{Engine, TagPush};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create a tag; annotated when a message is given.
pub fn tag(
    engine: &Engine,
    ctx: &Context,
    name: &str,
    message: Option<&str>,
    target: Option<&str>,
    push: TagPush,
) -> Result<()> {
    let path = ctx.repo_path()?;
    let oid = engine
        .create_tag(&path, name, message, target, push, &ctx.progress_sink())
        .with_context(|| format!("Failed to create tag '{name}'"))?;
    output::print(format!("Tagged {} as '{}'", oid.short(7), name), ctx.verbosity());
    Ok(())
}
