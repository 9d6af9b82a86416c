// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use psync_core::store::read_snapshot;

use super::Context;
use crate::cli::OutputFormat;
use crate::display::{LocalSummary, StatusReport};
use crate::error::Result;

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let store = ctx.open_store()?;
    let local = read_snapshot(store.as_ref(), &ctx.sync.collections, ctx.sync.source)?;

    let orchestrator = ctx.start(store, None);
    // Unreachable is a status, not a failure.
    if orchestrator.wait_connected(ctx.connect_timeout).await.is_ok() {
        let _ = orchestrator.ping().await;
    }
    let status = orchestrator.status();
    let report = StatusReport {
        url: &ctx.sync.url,
        state: orchestrator.state(),
        status: &status,
        store_path: &ctx.store_path,
        local: LocalSummary::of(&local),
    };

    match output {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    orchestrator.shutdown().await;
    Ok(())
}
