// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use psync_core::Snapshot;

use super::Context;
use crate::display::snapshot_summary;
use crate::error::Result;

pub async fn run(ctx: &Context) -> Result<Snapshot> {
    let orchestrator = ctx.connect(ctx.open_store()?).await?;
    let result = orchestrator.push().await;
    orchestrator.shutdown().await;

    let pushed = result?;
    println!("Pushed {}", snapshot_summary(&pushed));
    Ok(pushed)
}
