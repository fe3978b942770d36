//! commit command - Commit the staged changes

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{bail, Result};

/// Commit the staged changes.
pub fn commit(engine: &Engine, ctx: &Context, subject: &str, body: &str, amend: bool) -> Result<()> {
    if subject.trim().is_empty() {
        bail!("Commit subject cannot be empty");
    }

    let path = ctx.repo_path()?;
    let sink = ctx.progress_sink();
    let oid = engine.commit(&path, subject, body, amend, &sink)?;

    if ctx.json {
        return Ok(output::json(&serde_json::json!({ "commit": oid }))?);
    }
    output::print(format!("[{}] {}", oid.short(7), subject), ctx.verbosity());
    Ok(())
}
