//! log command - Show commit history, optionally with the lane graph

use crate::cli::Context;
use crate::core::history::CommitRecord;
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::json;

fn describe(record: &CommitRecord) -> String {
    let mut line = format!(
        "{} {} ({}, {})",
        record.hash.short(7),
        record.subject,
        record.author_name,
        record.date.format("%Y-%m-%d %H:%M")
    );
    if !record.refs.is_empty() {
        line.push_str(&format!(" [{}]", record.refs.join(", ")));
    }
    line
}

/// Show commit history.
///
/// `count` falls back to the configured history limit; 0 shows everything.
pub fn log(engine: &Engine, ctx: &Context, count: Option<i64>, graph: bool) -> Result<()> {
    let path = ctx.repo_path()?;
    let count = match count {
        Some(n) => n,
        None => engine.config(&path)?.history_limit(),
    };

    if !graph {
        let records = engine
            .history(&path, count)
            .context("Failed to read history")?;
        if ctx.json {
            return Ok(output::json(&records)?);
        }
        for record in &records {
            println!("{}", describe(record));
        }
        return Ok(());
    }

    let (records, layout) = engine
        .history_graph(&path, count)
        .context("Failed to read history")?;
    if ctx.json {
        return Ok(output::json(&json!({ "commits": records, "graph": layout }))?);
    }

    let rows = layout.render_text();
    let gutter = rows.iter().map(String::len).max().unwrap_or(0);
    for (row, record) in rows.iter().zip(&records) {
        println!("{row:<gutter$}  {}", describe(record));
    }
    Ok(())
}
