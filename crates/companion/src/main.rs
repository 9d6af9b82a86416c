// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! psync-companion: the data-owning side of a psync link.
//!
//! Serves its snapshot over WebSocket (`getData`), accepts replacements
//! (`setData`), and pushes `dataChanged` to every connected client when
//! the snapshot changes.

mod server;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use psync_core::Source;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// psync-companion: WebSocket companion for psync clients
#[derive(Parser, Debug)]
#[command(name = "psync-companion")]
#[command(about = "WebSocket companion serving snapshots to psync clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:9427")]
    bind: SocketAddr,

    /// Directory to persist the snapshot in (memory only if omitted)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Source recorded on a fresh snapshot
    #[arg(long, default_value = "desktop")]
    source: Source,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting psync-companion");
    info!("  Bind address: {}", args.bind);

    let state = match &args.data {
        Some(dir) => {
            info!("  Data directory: {}", dir.display());
            state::CompanionState::open(dir, args.source)?
        }
        None => {
            info!("  Data directory: none (in memory)");
            state::CompanionState::in_memory(args.source)
        }
    };

    server::run(args.bind, state).await
}
