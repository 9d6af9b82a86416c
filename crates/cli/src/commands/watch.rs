// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use psync_client::DEFAULT_AUTO_SYNC_INTERVAL;
use tracing::info;

use super::Context;
use crate::display::format_event;
use crate::error::Result;

pub async fn run(ctx: &Context, interval_secs: Option<u64>) -> Result<()> {
    let interval = match interval_secs {
        Some(secs) => Duration::from_secs(secs.max(1)),
        None => ctx.sync.auto_sync_interval.unwrap_or(DEFAULT_AUTO_SYNC_INTERVAL),
    };

    let orchestrator = ctx.start(ctx.open_store()?, Some(interval));
    orchestrator.subscribe_all(|event| println!("{}", format_event(event)));
    println!("Watching {} every {}s (ctrl-c to stop)", ctx.sync.url, interval.as_secs());

    tokio::signal::ctrl_c().await?;
    info!("interrupted, shutting down");
    orchestrator.shutdown().await;
    Ok(())
}
