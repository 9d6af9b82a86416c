// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use psync_client::SyncOutcome;
use psync_core::store::read_snapshot;

use super::Context;
use crate::display::{format_conflict, outcome_message, snapshot_summary};
use crate::error::Result;

pub async fn run(ctx: &Context) -> Result<SyncOutcome> {
    let store = ctx.open_store()?;
    let orchestrator = ctx.connect(Arc::clone(&store)).await?;
    let result = orchestrator.sync().await;

    if let Ok(outcome) = &result {
        println!("{}", outcome_message(*outcome));
        match outcome {
            SyncOutcome::AppliedRemote => {
                let local = read_snapshot(store.as_ref(), &ctx.sync.collections, ctx.sync.source)?;
                println!("  {}", snapshot_summary(&local));
            }
            SyncOutcome::Conflict => {
                if let Some(conflict) = orchestrator.pending_conflict() {
                    println!("{}", format_conflict(&conflict));
                }
            }
            SyncOutcome::Unchanged => {}
        }
    }

    orchestrator.shutdown().await;
    Ok(result?)
}
