// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflicts only live as long as the orchestrator that found them, so
//! resolving means syncing first and settling whatever that turns up.

use psync_client::SyncOutcome;
use psync_core::{Snapshot, Strategy};

use super::Context;
use crate::display::{outcome_message, snapshot_summary};
use crate::error::Result;

/// Returns the resolved snapshot, or `None` if the sync found no conflict.
pub async fn run(ctx: &Context, strategy: Strategy) -> Result<Option<Snapshot>> {
    let orchestrator = ctx.connect(ctx.open_store()?).await?;

    let result = match orchestrator.sync().await {
        Ok(SyncOutcome::Conflict) => orchestrator.resolve_conflict(strategy).await.map(Some),
        Ok(outcome) => {
            println!("No conflict: {}", outcome_message(outcome).to_lowercase());
            Ok(None)
        }
        Err(e) => Err(e),
    };
    orchestrator.shutdown().await;

    let resolved = result?;
    if let Some(snapshot) = &resolved {
        println!("Resolved with '{}': {}", strategy.as_str(), snapshot_summary(snapshot));
    }
    Ok(resolved)
}
