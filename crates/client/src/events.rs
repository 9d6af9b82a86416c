// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed publish/subscribe for sync lifecycle events.
//!
//! Handlers run synchronously, in subscription order, on the emitting
//! task. A panicking handler is logged and skipped; the remaining
//! handlers still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use psync_core::{Conflict, Snapshot};
use tracing::warn;

/// Kinds of event a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    DataChanged,
    ConflictDetected,
    DataSynced,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Connected,
        EventKind::Disconnected,
        EventKind::DataChanged,
        EventKind::ConflictDetected,
        EventKind::DataSynced,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::DataChanged => "dataChanged",
            EventKind::ConflictDetected => "conflictDetected",
            EventKind::DataSynced => "dataSynced",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation an error event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Establishing or holding the link.
    Connection,
    /// A caller-initiated sync.
    Sync,
    /// A scheduled sync.
    AutoSync,
    /// Reconciling a companion `dataChanged` push.
    RemoteChange,
    /// Conflict resolution, including write-back.
    Resolve,
    /// Pushing local data to the companion.
    Push,
    /// An error reported by the companion itself.
    Companion,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connection => "connection",
            Operation::Sync => "sync",
            Operation::AutoSync => "auto-sync",
            Operation::RemoteChange => "remote-change",
            Operation::Resolve => "resolve",
            Operation::Push => "push",
            Operation::Companion => "companion",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event published by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The companion link came up.
    Connected,
    /// The companion link went down. `None` means a clean close.
    Disconnected { cause: Option<String> },
    /// Local data was replaced; carries the snapshot now in the store.
    DataChanged { snapshot: Snapshot },
    /// Both sides changed close together and need a decision.
    ConflictDetected { conflict: Conflict },
    /// Local and companion data are known to agree.
    DataSynced { at: DateTime<Utc> },
    /// An operation failed.
    Error { operation: Operation, message: String },
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::Connected => EventKind::Connected,
            SyncEvent::Disconnected { .. } => EventKind::Disconnected,
            SyncEvent::DataChanged { .. } => EventKind::DataChanged,
            SyncEvent::ConflictDetected { .. } => EventKind::ConflictDetected,
            SyncEvent::DataSynced { .. } => EventKind::DataSynced,
            SyncEvent::Error { .. } => EventKind::Error,
        }
    }
}

/// Identifies a subscription for [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Registry of event handlers, keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.subscribe_to(&[kind], Arc::new(handler))
    }

    /// Register `handler` for every kind of event.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.subscribe_to(&EventKind::ALL, Arc::new(handler))
    }

    fn subscribe_to(&self, kinds: &[EventKind], handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        for kind in kinds {
            handlers.entry(*kind).or_default().push((id, Arc::clone(&handler)));
        }
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let mut removed = false;
        for list in handlers.values_mut() {
            let before = list.len();
            list.retain(|(sub, _)| *sub != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Number of handlers registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler subscribed to its kind.
    ///
    /// Returns how many handlers completed without panicking.
    pub fn emit(&self, event: &SyncEvent) -> usize {
        let kind = event.kind();
        // Snapshot the list so handlers may (un)subscribe re-entrantly
        let handlers: Vec<Handler> = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            handlers
                .get(&kind)
                .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };

        let mut delivered = 0;
        for handler in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(event = %kind, "event handler panicked"),
            }
        }
        delivered
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
