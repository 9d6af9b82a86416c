// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! psync_cli - command line front-end for the psync engine.
//!
//! Drives one [`SyncOrchestrator`](psync_client::SyncOrchestrator) against a
//! companion process, with a [`JsonFileStore`] as the local side.
//!
//! # Main Components
//!
//! - [`Cli`] - argument definitions
//! - [`ConfigFile`] - TOML configuration (`<config dir>/psync/config.toml`)
//! - [`JsonFileStore`] - local store persisted as one JSON document
//! - [`Error`] - Error types for all commands

mod cli;
mod commands;
mod display;

pub mod config;
pub mod error;
pub mod store;

pub use cli::{Cli, Command, OutputFormat};
pub use commands::Context;
pub use config::ConfigFile;
pub use error::{Error, Result};
pub use store::JsonFileStore;

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.url.as_deref())?;
    match cli.command {
        Command::Status { output } => commands::status::run(&ctx, output).await,
        Command::Sync => commands::sync::run(&ctx).await.map(|_| ()),
        Command::Push => commands::push::run(&ctx).await.map(|_| ()),
        Command::Resolve { strategy } => commands::resolve::run(&ctx, strategy).await.map(|_| ()),
        Command::Watch { interval } => commands::watch::run(&ctx, interval).await,
    }
}
