// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use psync_core::Strategy;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "psync", version)]
#[command(about = "Keep a local prompt library in sync with a psync companion")]
#[command(after_help = "\
Get started:
  psync-companion --data ~/.psync   Start a companion
  psync status                      Check the link
  psync sync                        Pull companion changes
  psync push                        Send local changes
  psync watch                       Stay in sync until interrupted")]
pub struct Cli {
    /// Config file (default: <config dir>/psync/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Companion url, overriding the config file
    #[arg(long, global = true, value_name = "url")]
    pub url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show link and local store status
    Status {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Reconcile local data with the companion once
    Sync,

    /// Send local data to the companion
    Push,

    /// Sync, then settle a conflict with the given strategy
    #[command(after_help = "\
Strategies:
  local    Keep local data and write it to the companion
  remote   Take the companion's data
  merge    Combine both, newest record wins")]
    Resolve {
        /// local, remote or merge
        strategy: Strategy,
    },

    /// Stay connected, syncing periodically and printing events
    Watch {
        /// Seconds between syncs (default: from config)
        #[arg(long, short, value_name = "secs")]
        interval: Option<u64>,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
