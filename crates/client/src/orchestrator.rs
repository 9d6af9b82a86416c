// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync orchestrator.
//!
//! Owns the channel, the RPC client, the event bus and the auto-sync
//! timer, and drives the state machine:
//!
//! ```text
//! Connecting ──► Connected ──► Syncing ──► Connected
//!      ▲             │            ├──────► ConflictPending ──resolve──► Connected
//!      │             │            └──────► Error ──next success──► Connected
//!      └──────── Disconnected ◄── (any state on link loss)
//! ```
//!
//! Reconciliations (sync, push, resolve, remote changes) are serialized;
//! only one touches the local store at a time.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use psync_core::protocol::{CompanionEvent, Method};
use psync_core::store::{apply_snapshot, read_snapshot};
use psync_core::{
    resolve, ClockSource, Conflict, ConflictDetector, LocalStore, Outcome, Snapshot, Strategy,
    SystemClock,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelEvent};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{EventBus, EventKind, Operation, SubscriptionId, SyncEvent};
use crate::rpc::{PendingCalls, RpcClient};
use crate::scheduler::AutoSync;
use crate::transport::{Transport, WebSocketTransport};

/// Point-in-time view of the sync link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub connected: bool,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    pub has_conflicts: bool,
    /// Message of the most recent failure, cleared by the next successful sync.
    pub last_error: Option<String>,
}

/// Orchestrator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    Disconnected,
    Connecting,
    Connected,
    Syncing,
    ConflictPending,
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Disconnected => "disconnected",
            SyncState::Connecting => "connecting",
            SyncState::Connected => "connected",
            SyncState::Syncing => "syncing",
            SyncState::ConflictPending => "conflict pending",
            SyncState::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a completed sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Both sides already held the same content.
    Unchanged,
    /// The companion's snapshot replaced local data.
    AppliedRemote,
    /// Both sides changed too close together; a resolution is pending.
    Conflict,
}

/// Keeps a [`LocalStore`] in sync with a companion process.
///
/// Construction spawns background tasks and must happen inside a tokio
/// runtime. Dropping the orchestrator has the same effect as
/// [`destroy`](Self::destroy).
pub struct SyncOrchestrator {
    engine: Arc<Engine>,
    channel: Channel,
}

impl SyncOrchestrator {
    /// Connect to the companion over WebSocket.
    pub fn connect(config: SyncConfig, store: Arc<dyn LocalStore>) -> Self {
        Self::with_transport(config, store, Arc::new(SystemClock), WebSocketTransport::new)
    }

    /// Create an orchestrator with a custom transport and clock.
    ///
    /// `factory` builds a fresh transport for each connection attempt.
    pub fn with_transport<T, F>(
        config: SyncConfig,
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn ClockSource>,
        factory: F,
    ) -> Self
    where
        T: Transport + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let pending = Arc::new(PendingCalls::new());
        let (channel, events) = Channel::spawn(config.channel(), factory, Arc::clone(&pending));
        let rpc = RpcClient::new(channel.handle(), pending, config.request_timeout);

        let engine = Arc::new(Engine {
            detector: ConflictDetector::new(config.conflict_window),
            inner: Mutex::new(EngineState {
                state: SyncState::Disconnected,
                status: SyncStatus::default(),
                conflict: None,
                auto_sync: config.auto_sync_interval,
                destroyed: false,
            }),
            config,
            store,
            clock,
            rpc,
            bus: EventBus::new(),
            scheduler: AutoSync::new(),
            reconcile: tokio::sync::Mutex::new(()),
            connected: Notify::new(),
        });
        tokio::spawn(pump_events(Arc::clone(&engine), events));

        SyncOrchestrator { engine, channel }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.engine.config
    }

    pub fn status(&self) -> SyncStatus {
        self.engine.lock().status.clone()
    }

    pub fn state(&self) -> SyncState {
        self.engine.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.engine.lock().status.connected
    }

    /// The conflict awaiting resolution, if any.
    pub fn pending_conflict(&self) -> Option<Conflict> {
        self.engine.lock().conflict.clone()
    }

    /// Wait until the link is up, or fail with [`SyncError::NotConnected`]
    /// after `timeout`.
    pub async fn wait_connected(&self, timeout: Duration) -> SyncResult<()> {
        let wait = async {
            loop {
                let notified = self.engine.connected.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.is_connected() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.map_err(|_| SyncError::NotConnected)
    }

    /// Fetch the companion's snapshot and reconcile it with local data.
    ///
    /// Fails with [`SyncError::ConflictUnresolved`] while a conflict is
    /// pending.
    pub async fn sync(&self) -> SyncResult<SyncOutcome> {
        self.engine.run_sync(Operation::Sync).await
    }

    /// Settle the pending conflict and write the result back.
    ///
    /// The result is applied locally first. If writing it back fails the
    /// conflict stays resolved and [`SyncError::MergeWriteBackFailed`] is
    /// returned.
    pub async fn resolve_conflict(&self, strategy: Strategy) -> SyncResult<Snapshot> {
        self.engine.resolve_conflict(strategy).await
    }

    /// Drop the pending conflict without changing any data. Returns false
    /// if there was none.
    pub fn dismiss_conflict(&self) -> bool {
        let mut inner = self.engine.lock();
        if inner.conflict.take().is_none() {
            return false;
        }
        inner.status.has_conflicts = false;
        if inner.state == SyncState::ConflictPending {
            inner.state = SyncState::Connected;
        }
        info!("pending conflict dismissed");
        true
    }

    /// Send local data to the companion unconditionally.
    pub async fn push(&self) -> SyncResult<Snapshot> {
        self.engine.push().await
    }

    /// Round-trip a ping to the companion.
    pub async fn ping(&self) -> SyncResult<()> {
        let result = self.engine.rpc.call(Method::Ping, Value::Null).await.map(|_| ());
        if let Err(e) = &result {
            self.engine.fail(Operation::Connection, e);
        }
        result
    }

    /// Sync every `interval` while connected. Replaces any previous
    /// interval; survives reconnects.
    pub fn start_auto_sync(&self, interval: Duration) {
        let connected = {
            let mut inner = self.engine.lock();
            if inner.destroyed {
                return;
            }
            inner.auto_sync = Some(interval);
            inner.status.connected
        };
        if connected {
            self.engine.start_scheduler(interval);
        }
    }

    pub fn stop_auto_sync(&self) {
        self.engine.lock().auto_sync = None;
        self.engine.scheduler.stop();
    }

    pub fn is_auto_syncing(&self) -> bool {
        self.engine.scheduler.is_running()
    }

    /// Interval of the running auto-sync timer, after clamping to
    /// [`MIN_INTERVAL`](crate::MIN_INTERVAL).
    pub fn auto_sync_interval(&self) -> Option<Duration> {
        self.engine.scheduler.interval()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        let id = self.engine.bus.subscribe(kind, handler);
        debug!(%kind, subscribers = self.engine.bus.subscriber_count(kind), "handler subscribed");
        id
    }

    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.engine.bus.subscribe_all(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.engine.bus.unsubscribe(id)
    }

    /// Forget the last error and leave the error state.
    pub fn clear_error(&self) {
        let mut inner = self.engine.lock();
        inner.status.last_error = None;
        if inner.state == SyncState::Error {
            inner.state =
                if inner.status.connected { SyncState::Connected } else { SyncState::Disconnected };
        }
    }

    /// Stop auto-sync and tear down the link. Idempotent.
    pub fn destroy(&self) {
        let was_connected = {
            let mut inner = self.engine.lock();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.auto_sync = None;
            inner.state = SyncState::Disconnected;
            std::mem::replace(&mut inner.status.connected, false)
        };
        self.engine.scheduler.stop();
        self.channel.destroy();
        info!("sync orchestrator destroyed");
        if was_connected {
            self.engine.emit(SyncEvent::Disconnected { cause: None });
        }
    }

    /// [`destroy`](Self::destroy), then wait for the link to close.
    pub async fn shutdown(&self) {
        self.destroy();
        self.channel.closed().await;
    }
}

impl fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator").finish_non_exhaustive()
    }
}

impl Drop for SyncOrchestrator {
    fn drop(&mut self) {
        self.destroy();
    }
}

struct EngineState {
    state: SyncState,
    status: SyncStatus,
    conflict: Option<Conflict>,
    /// Interval to run auto-sync at whenever connected.
    auto_sync: Option<Duration>,
    destroyed: bool,
}

/// Shared core of the orchestrator, reachable from background tasks.
struct Engine {
    config: SyncConfig,
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn ClockSource>,
    detector: ConflictDetector,
    rpc: RpcClient,
    bus: EventBus,
    scheduler: AutoSync,
    inner: Mutex<EngineState>,
    /// Held for the duration of any reconciliation.
    reconcile: tokio::sync::Mutex<()>,
    connected: Notify,
}

async fn pump_events(engine: Arc<Engine>, mut events: mpsc::UnboundedReceiver<ChannelEvent>) {
    while let Some(event) = events.recv().await {
        engine.handle_channel_event(event);
    }
    debug!("channel event pump exited");
}

impl Engine {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Never call with the state lock held; handlers may call back in.
    fn emit(&self, event: SyncEvent) {
        self.bus.emit(&event);
    }

    fn handle_channel_event(self: &Arc<Self>, event: ChannelEvent) {
        if self.lock().destroyed {
            return;
        }
        match event {
            ChannelEvent::Connecting { attempt } => {
                let mut inner = self.lock();
                if inner.state == SyncState::Disconnected {
                    inner.state = SyncState::Connecting;
                }
                debug!(attempt, url = %self.config.url, "connecting to companion");
            }
            ChannelEvent::Connected => self.on_connected(),
            ChannelEvent::ConnectFailed { attempt, cause } => {
                self.lock().state = SyncState::Disconnected;
                self.report(Operation::Connection, format!("connect attempt {attempt} failed: {cause}"));
            }
            ChannelEvent::Disconnected { cause } => self.on_disconnected(cause),
            ChannelEvent::Notification(event) => self.on_notification(event),
            ChannelEvent::Malformed { cause } => {
                self.report(Operation::RemoteChange, format!("malformed companion message: {cause}"));
            }
        }
    }

    fn on_connected(self: &Arc<Self>) {
        let auto_sync = {
            let mut inner = self.lock();
            inner.status.connected = true;
            inner.state = if inner.conflict.is_some() {
                SyncState::ConflictPending
            } else {
                SyncState::Connected
            };
            inner.auto_sync
        };
        self.connected.notify_waiters();
        self.emit(SyncEvent::Connected);
        if let Some(interval) = auto_sync {
            self.start_scheduler(interval);
        }
    }

    fn on_disconnected(&self, cause: Option<String>) {
        self.scheduler.stop();
        {
            let mut inner = self.lock();
            inner.status.connected = false;
            inner.status.has_conflicts = inner.conflict.is_some();
            inner.state = SyncState::Disconnected;
        }
        self.emit(SyncEvent::Disconnected { cause: cause.clone() });
        if let Some(cause) = cause {
            self.report(Operation::Connection, format!("connection lost: {cause}"));
        }
    }

    fn on_notification(self: &Arc<Self>, event: CompanionEvent) {
        match event {
            CompanionEvent::DataChanged(snapshot) => {
                debug!(checksum = snapshot.checksum(), "companion data changed");
                let engine = Arc::clone(self);
                tokio::spawn(async move { engine.reconcile_remote_change(snapshot).await });
            }
            CompanionEvent::ConflictDetected => {
                if self.lock().conflict.is_some() {
                    return;
                }
                info!("companion reported a conflict, syncing");
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    let _ = engine.run_sync(Operation::RemoteChange).await;
                });
            }
            CompanionEvent::SyncComplete => debug!("companion finished applying a write"),
            CompanionEvent::Error { message } => self.report(Operation::Companion, message),
        }
    }

    fn start_scheduler(self: &Arc<Self>, interval: Duration) {
        let engine = Arc::downgrade(self);
        self.scheduler.start(interval, move || {
            let engine = engine.clone();
            async move {
                if let Some(engine) = engine.upgrade() {
                    engine.auto_sync_tick().await;
                }
            }
        });
    }

    async fn auto_sync_tick(&self) {
        if self.lock().conflict.is_some() {
            debug!("conflict pending, skipping auto-sync");
            return;
        }
        let _ = self.run_sync(Operation::AutoSync).await;
    }

    /// Record a failure and publish it.
    fn fail(&self, operation: Operation, err: &SyncError) {
        self.report(operation, err.to_string());
    }

    fn report(&self, operation: Operation, message: String) {
        warn!(%operation, %message, "sync operation failed");
        self.lock().status.last_error = Some(message.clone());
        self.emit(SyncEvent::Error { operation, message });
    }

    fn check_ready(&self) -> SyncResult<()> {
        let inner = self.lock();
        if inner.destroyed || !self.rpc.is_connected() {
            return Err(SyncError::NotConnected);
        }
        if inner.conflict.is_some() {
            return Err(SyncError::ConflictUnresolved);
        }
        Ok(())
    }

    fn enter_syncing(&self) {
        self.lock().state = SyncState::Syncing;
    }

    /// Leave `Syncing` unless something else already moved the state on.
    fn leave_syncing<T>(&self, result: &SyncResult<T>) {
        let connected = self.rpc.is_connected();
        let mut inner = self.lock();
        if inner.state != SyncState::Syncing {
            return;
        }
        inner.state = match result {
            Err(e) if !e.is_transport() => SyncState::Error,
            _ if connected => SyncState::Connected,
            _ => SyncState::Disconnected,
        };
    }

    async fn run_sync(&self, operation: Operation) -> SyncResult<SyncOutcome> {
        let result = self.try_sync().await;
        if let Err(e) = &result {
            self.fail(operation, e);
        }
        result
    }

    async fn try_sync(&self) -> SyncResult<SyncOutcome> {
        self.check_ready()?;
        let _guard = self.reconcile.lock().await;
        // Another reconciliation may have raised a conflict meanwhile
        self.check_ready()?;

        self.enter_syncing();
        let result = self.fetch_and_reconcile().await;
        self.leave_syncing(&result);
        result
    }

    async fn fetch_and_reconcile(&self) -> SyncResult<SyncOutcome> {
        let data = self.rpc.call(Method::GetData, Value::Null).await?;
        let remote: Snapshot = serde_json::from_value(data)?;
        self.reconcile_with(remote)
    }

    async fn reconcile_remote_change(&self, remote: Snapshot) {
        let _guard = self.reconcile.lock().await;
        if self.lock().conflict.is_some() {
            debug!("conflict pending, ignoring companion change");
            return;
        }

        self.enter_syncing();
        let result = self.reconcile_with(remote);
        self.leave_syncing(&result);
        if let Err(e) = &result {
            self.fail(Operation::RemoteChange, e);
        }
    }

    /// Compare `remote` against the local store and act on the outcome.
    /// Caller holds the reconcile lock.
    fn reconcile_with(&self, remote: Snapshot) -> SyncResult<SyncOutcome> {
        let local = read_snapshot(&*self.store, &self.config.collections, self.config.source)?;

        match self.detector.detect(&local, &remote) {
            Outcome::NoOp => {
                debug!(checksum = local.checksum(), "already in sync");
                self.mark_synced();
                Ok(SyncOutcome::Unchanged)
            }
            Outcome::ApplyRemote => {
                apply_snapshot(&*self.store, &remote, &self.config.collections)?;
                info!(
                    checksum = remote.checksum(),
                    last_modified = %remote.last_modified(),
                    "applied companion data"
                );
                self.emit(SyncEvent::DataChanged { snapshot: remote });
                self.mark_synced();
                Ok(SyncOutcome::AppliedRemote)
            }
            Outcome::Conflict => {
                warn!(
                    local = %local.last_modified(),
                    remote = %remote.last_modified(),
                    "conflicting changes detected"
                );
                let conflict = Conflict::new(local, remote, self.clock.now());
                {
                    let mut inner = self.lock();
                    inner.conflict = Some(conflict.clone());
                    inner.status.has_conflicts = true;
                    inner.state = SyncState::ConflictPending;
                }
                self.emit(SyncEvent::ConflictDetected { conflict });
                Ok(SyncOutcome::Conflict)
            }
        }
    }

    fn mark_synced(&self) {
        let at = self.clock.now();
        {
            let mut inner = self.lock();
            inner.status.last_sync_timestamp = Some(at);
            inner.status.last_error = None;
        }
        self.emit(SyncEvent::DataSynced { at });
    }

    async fn resolve_conflict(&self, strategy: Strategy) -> SyncResult<Snapshot> {
        let result = self.try_resolve(strategy).await;
        if let Err(e) = &result {
            self.fail(Operation::Resolve, e);
        }
        result
    }

    async fn try_resolve(&self, strategy: Strategy) -> SyncResult<Snapshot> {
        let _guard = self.reconcile.lock().await;
        let conflict = self.lock().conflict.clone().ok_or(SyncError::NoPendingConflict)?;

        let resolved = resolve(&conflict, strategy, self.clock.now());
        // On a store failure the conflict stays pending
        apply_snapshot(&*self.store, &resolved, &self.config.collections)?;

        let connected = self.rpc.is_connected();
        {
            let mut inner = self.lock();
            inner.conflict = None;
            inner.status.has_conflicts = false;
            inner.state = if connected { SyncState::Connected } else { SyncState::Disconnected };
        }
        info!(%strategy, checksum = resolved.checksum(), "conflict resolved");
        if !resolved.content_equals(&conflict.local) {
            self.emit(SyncEvent::DataChanged { snapshot: resolved.clone() });
        }

        self.write_back(&resolved)
            .await
            .map_err(|e| SyncError::MergeWriteBackFailed(Box::new(e)))?;
        self.mark_synced();
        Ok(resolved)
    }

    async fn push(&self) -> SyncResult<Snapshot> {
        let result = self.try_push().await;
        if let Err(e) = &result {
            self.fail(Operation::Push, e);
        }
        result
    }

    async fn try_push(&self) -> SyncResult<Snapshot> {
        self.check_ready()?;
        let _guard = self.reconcile.lock().await;
        self.check_ready()?;

        let local = read_snapshot(&*self.store, &self.config.collections, self.config.source)?;
        self.write_back(&local).await?;
        info!(checksum = local.checksum(), "pushed local data");
        self.mark_synced();
        Ok(local)
    }

    async fn write_back(&self, snapshot: &Snapshot) -> SyncResult<()> {
        let payload = serde_json::to_value(snapshot)?;
        self.rpc.call(Method::SetData, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
