// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! psync-client: keeps a local store in step with a companion process.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncOrchestrator │────►│  RpcClient  │────►│   Channel   │────► companion
//! │   (public API)   │     └─────────────┘     │ (Transport) │◄──── (ws://)
//! └──────────────────┘◄────────────────────────└─────────────┘
//!     │        │            channel events
//!     ▼        ▼
//! ┌────────┐ ┌──────────┐
//! │AutoSync│ │ EventBus │ ──► subscribers
//! └────────┘ └──────────┘
//! ```
//!
//! # Features
//!
//! - WebSocket connection with a fixed-delay reconnect loop
//! - Correlated request/response calls with a per-call timeout
//! - Checksum-based change detection and a timestamp conflict window
//! - `local`, `remote` and `merge` conflict resolution with write-back
//! - Single-flight periodic auto-sync
//! - Injectable transport trait for testing

mod channel;
mod config;
mod error;
mod events;
mod orchestrator;
mod rpc;
mod scheduler;
mod transport;

pub use channel::DEFAULT_RECONNECT_DELAY;
pub use config::{SyncConfig, DEFAULT_AUTO_SYNC_INTERVAL, DEFAULT_URL};
pub use error::{SyncError, SyncResult};
pub use events::{EventKind, Operation, SubscriptionId, SyncEvent};
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncState, SyncStatus};
pub use rpc::DEFAULT_REQUEST_TIMEOUT;
pub use scheduler::MIN_INTERVAL;
pub use transport::{
    Transport, TransportError, TransportFuture, TransportResult, WebSocketTransport,
};

#[cfg(test)]
mod test_helpers;
