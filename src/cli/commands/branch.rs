//! branch command - List, create and delete branches

use crate::cli::Context;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List local branches, remote branches, or the folder tree.
pub fn list(engine: &Engine, ctx: &Context, remote: bool, tree: bool) -> Result<()> {
    let path = ctx.repo_path()?;

    if remote {
        let groups = engine
            .remote_branches(&path)
            .context("Failed to list remote branches")?;
        if ctx.json {
            return Ok(output::json(&groups)?);
        }
        for group in &groups {
            println!("{}:", group.remote);
            if !group.branches.is_empty() {
                println!("{}", output::format_list(&group.branches, "  "));
            }
        }
        return Ok(());
    }

    if tree {
        let tree = engine
            .branch_tree(&path)
            .context("Failed to list branches")?;
        if ctx.json {
            return Ok(output::json(&tree)?);
        }
        for (depth, node) in tree.walk() {
            let marker = if node.is_folder() { "/" } else { "" };
            println!("{}{}{}", "  ".repeat(depth), node.label, marker);
        }
        return Ok(());
    }

    let branches = engine.branches(&path).context("Failed to list branches")?;
    if ctx.json {
        return Ok(output::json(&branches)?);
    }
    for branch in &branches {
        let marker = if branch.is_current { "*" } else { " " };
        match &branch.upstream {
            Some(upstream) => println!("{} {} -> {}", marker, branch.name, upstream),
            None => println!("{} {}", marker, branch.name),
        }
    }
    Ok(())
}

/// Create a branch.
pub fn create(
    engine: &Engine,
    ctx: &Context,
    name: &str,
    from: Option<&str>,
    checkout: bool,
) -> Result<()> {
    let path = ctx.repo_path()?;
    let oid = engine
        .create_branch(&path, name, from, checkout)
        .with_context(|| format!("Failed to create branch '{name}'"))?;

    let message = if checkout {
        format!("Created and checked out '{}' at {}", name, oid.short(7))
    } else {
        format!("Created '{}' at {}", name, oid.short(7))
    };
    output::print(message, ctx.verbosity());
    Ok(())
}

/// Delete a branch, optionally on the remote too.
pub fn delete(engine: &Engine, ctx: &Context, name: &str, remote: bool) -> Result<()> {
    let path = ctx.repo_path()?;
    let sink = ctx.progress_sink();
    engine
        .delete_branch(&path, name, remote, &sink)
        .with_context(|| format!("Failed to delete branch '{name}'"))?;
    output::print(format!("Deleted '{name}'"), ctx.verbosity());
    Ok(())
}
