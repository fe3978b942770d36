//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the request
//! 3. Formats and displays output (text, or JSON with `--json`)
//!
//! Handlers do NOT open repositories themselves.

mod branch;
mod checkout;
mod commit;
mod completion;
mod config_cmd;
mod diff;
mod info;
mod init;
mod log_cmd;
mod stage;
mod stash;
mod status;
mod sync;
mod tag;

// Re-export command functions for testing and direct invocation
pub use branch::{create as branch_create, delete as branch_delete, list as branch_list};
pub use checkout::checkout;
pub use commit::commit;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use diff::{diff, show};
pub use info::summary;
pub use init::init;
pub use log_cmd::log;
pub use stage::{discard, stage, unstage};
pub use stash::{drop as stash_drop, list as stash_list, pop as stash_pop, save as stash_save};
pub use status::status;
pub use sync::{fetch, pull, push};
pub use tag::tag;

use crate::cli::args::{BranchAction, Command, ConfigAction, StashAction};
use crate::cli::Context;
use crate::engine::{Engine, TagPush};
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, engine: &Engine, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init::init(engine, ctx),
        Command::Status => status::status(engine, ctx),
        Command::Stage { files, all } => stage::stage(engine, ctx, &files, all),
        Command::Unstage { files, all } => stage::unstage(engine, ctx, &files, all),
        Command::Discard { files } => stage::discard(engine, ctx, &files),
        Command::Stash { action } => match action {
            StashAction::Save { files, message } => {
                stash::save(engine, ctx, &files, message.as_deref())
            }
            StashAction::List => stash::list(engine, ctx),
            StashAction::Drop { index } => stash::drop(engine, ctx, index),
            StashAction::Pop { index } => stash::pop(engine, ctx, index),
        },
        Command::Diff { file, staged } => diff::diff(engine, ctx, &file, staged),
        Command::Commit {
            subject,
            body,
            amend,
        } => commit::commit(engine, ctx, &subject, &body, amend),
        Command::Log { count, graph } => log_cmd::log(engine, ctx, count, graph),
        Command::Show { hash, file } => diff::show(engine, ctx, &hash, file.as_deref()),
        Command::Branch { action } => match action {
            BranchAction::List { remote, tree } => branch::list(engine, ctx, remote, tree),
            BranchAction::Create {
                name,
                from,
                checkout,
            } => branch::create(engine, ctx, &name, from.as_deref(), checkout),
            BranchAction::Delete { name, remote } => branch::delete(engine, ctx, &name, remote),
        },
        Command::Checkout { name, remote } => checkout::checkout(engine, ctx, &name, remote),
        Command::Tag {
            name,
            message,
            target,
            push,
            push_all,
        } => {
            let push = if push_all {
                TagPush::All
            } else if push {
                TagPush::Tag
            } else {
                TagPush::None
            };
            tag::tag(engine, ctx, &name, message.as_deref(), target.as_deref(), push)
        }
        Command::Fetch => sync::fetch(engine, ctx),
        Command::Pull => sync::pull(engine, ctx),
        Command::Push => sync::push(engine, ctx),
        Command::Summary => info::summary(engine, ctx),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(engine, ctx, &key),
            ConfigAction::Set { key, value, global } => {
                config_cmd::set(engine, ctx, &key, &value, global)
            }
            ConfigAction::List => config_cmd::list(engine, ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
