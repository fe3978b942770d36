//! config command - Get, set, and list configuration values
//!
//! `set` writes repo-level keys (`remote`, `history_limit`) to the working
//! copy's config when run inside a repository, and everything else to the
//! global config. `--global` always writes the global config.

use crate::cli::Context;
use crate::core::config::{Config, ConfigError, RepoConfig, KEYS};
use crate::engine::Engine;
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::{json, Map, Value};

/// Keys that a repository config may override.
const REPO_KEYS: &[&str] = &["remote", "history_limit"];

/// Get a configuration value.
pub fn get(engine: &Engine, ctx: &Context, key: &str) -> Result<()> {
    let path = ctx.repo_path()?;
    let config = engine.config(&path)?;

    match config.get(key)? {
        Some(value) if ctx.json => output::json(&json!({ key: value }))?,
        Some(value) => println!("{value}"),
        None if ctx.json => output::json(&json!({ key: Value::Null }))?,
        None => output::warn(format!("{key} is not set"), ctx.verbosity()),
    }
    Ok(())
}

/// Set a configuration value.
pub fn set(engine: &Engine, ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    if !KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()).into());
    }

    let path = ctx.repo_path()?;
    let config = engine.config(&path)?;
    let repo_level = REPO_KEYS.contains(&key) && !global && engine.is_repo(&path)?;

    let written = if repo_level {
        let mut repo = config.repo.clone().unwrap_or_else(RepoConfig::default);
        repo.set_key(key, value)?;
        Config::write_repo(&path, &repo).context("Failed to write repository config")?
    } else {
        let mut global = config.global.clone();
        global.set_key(key, value)?;
        Config::write_global(&global).context("Failed to write global config")?
    };

    output::print(
        format!("Set {} = {} in {}", key, value, written.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// List all configuration values with their effective values.
pub fn list(engine: &Engine, ctx: &Context) -> Result<()> {
    let path = ctx.repo_path()?;
    let config = engine.config(&path)?;

    if ctx.json {
        let mut values = Map::new();
        for key in KEYS {
            let value = config.get(key)?.map_or(Value::Null, Value::String);
            values.insert(key.to_string(), value);
        }
        return Ok(output::json(&values)?);
    }

    for key in KEYS {
        match config.get(key)? {
            Some(value) => println!("{key} = {value}"),
            None => println!("{key} ="),
        }
    }

    if let Some(file) = config.global_config_loaded_from() {
        output::print(format!("# global: {}", file.display()), ctx.verbosity());
    }
    if let Some(file) = config.repo_config_loaded_from() {
        output::print(format!("# repo:   {}", file.display()), ctx.verbosity());
    }
    Ok(())
}
