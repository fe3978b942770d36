//! diff and show commands - File diffs and commit contents

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::json;

/// Show the working-copy diff of one file.
pub fn diff(engine: &Engine, ctx: &Context, file: &str, staged: bool) -> Result<()> {
    let path = ctx.repo_path()?;
    let text = engine
        .file_diff(&path, file, staged)
        .with_context(|| format!("Failed to diff {file}"))?;

    if ctx.json {
        return Ok(output::json(&json!({ "file": file, "staged": staged, "diff": text }))?);
    }
    print!("{text}");
    Ok(())
}

/// Show the files a commit changed, or one file's diff in that commit.
pub fn show(engine: &Engine, ctx: &Context, hash: &str, file: Option<&str>) -> Result<()> {
    let path = ctx.repo_path()?;

    if let Some(file) = file {
        let text = engine
            .commit_file_diff(&path, hash, file)
            .with_context(|| format!("Failed to diff {file} in {hash}"))?;
        if ctx.json {
            return Ok(output::json(&json!({ "commit": hash, "file": file, "diff": text }))?);
        }
        print!("{text}");
        return Ok(());
    }

    let changes = engine
        .commit_changes(&path, hash)
        .with_context(|| format!("Failed to read commit {hash}"))?;
    if ctx.json {
        return Ok(output::json(&changes)?);
    }
    for change in &changes {
        println!("{} {}", change.status, change.path);
    }
    Ok(())
}
