//! summary command - Repository overview

use crate::cli::Context;
use crate::engine::{Engine, RepoSummary};
use crate::ui::output;
use anyhow::{Context as _, Result};

fn render(summary: &RepoSummary) -> String {
    let mut lines = vec![
        format!("Repository: {}", summary.name),
        format!("Size:       {:.2} MiB", summary.size_mb),
    ];
    if let Some(url) = &summary.remote_url {
        lines.push(format!("Remote:     {url}"));
    }
    if let Some(branch) = &summary.current_branch {
        lines.push(format!("Branch:     {branch}"));
    }
    lines.push(format!("Commits:    {}", summary.commit_count));
    if let (Some(first), Some(last)) = (summary.first_commit, summary.last_commit) {
        lines.push(format!(
            "Active:     {} .. {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ));
    }
    if summary.is_clean {
        lines.push("Worktree:   clean".to_string());
    } else {
        lines.push(format!("Worktree:   {} changed file(s)", summary.modified_files.len()));
        lines.push(output::format_list(&summary.modified_files, "  "));
    }
    lines.push(format!("Branches:   {}", summary.branches.join(", ")));
    for remote in &summary.remotes {
        lines.push(format!("Remote {}: {} branch(es)", remote.remote, remote.branches.len()));
    }
    if !summary.tags.is_empty() {
        lines.push(format!("Tags:       {}", summary.tags.join(", ")));
    }
    if let Some(stash) = &summary.latest_stash {
        lines.push(format!("Stash:      {stash}"));
    }
    lines.join("\n")
}

/// Show an overview of the repository.
pub fn summary(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    let summary = engine
        .summary(&path)
        .context("Failed to summarize repository")?;

    if ctx.json {
        return Ok(output::json(&summary)?);
    }
    println!("{}", render(&summary));
    Ok(())
}
