// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response correlation over the companion channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use psync_core::protocol::{Method, Request, Response};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::channel::ChannelHandle;
use crate::error::{SyncError, SyncResult};

/// How long a call waits for its response unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What a waiting call receives.
#[derive(Debug)]
enum Reply {
    Response(Response),
    /// The link dropped before a response arrived.
    Disconnected(Option<String>),
}

/// Calls awaiting a response, keyed by correlation id.
#[derive(Default)]
pub struct PendingCalls {
    calls: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, oneshot::Sender<Reply>>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn register(&self, id: &str) -> oneshot::Receiver<Reply> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.to_string(), tx);
        rx
    }

    fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Deliver a response to its waiting call.
    ///
    /// Returns false if no call is waiting on that id, e.g. because it
    /// already timed out.
    pub fn resolve(&self, response: Response) -> bool {
        let Some(tx) = self.lock().remove(&response.id) else {
            return false;
        };
        tx.send(Reply::Response(response)).is_ok()
    }

    /// Fail every waiting call with a transport error. Returns how many
    /// calls were failed.
    pub fn fail_all(&self, cause: Option<String>) -> usize {
        let calls: Vec<_> = self.lock().drain().collect();
        let count = calls.len();
        for (_, tx) in calls {
            let _ = tx.send(Reply::Disconnected(cause.clone()));
        }
        count
    }

    /// Number of calls waiting for a response.
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Removes a call's table entry however the call ends, including when the
/// calling future is dropped.
struct Registration<'a> {
    pending: &'a PendingCalls,
    id: &'a str,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.id);
    }
}

/// Issues correlated calls to the companion.
pub struct RpcClient {
    channel: ChannelHandle,
    pending: Arc<PendingCalls>,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(channel: ChannelHandle, pending: Arc<PendingCalls>, timeout: Duration) -> Self {
        Self { channel, pending, timeout, next_id: AtomicU64::new(1) }
    }

    /// Check if the underlying link is up.
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Send `method` with `payload` and wait for the matching response.
    ///
    /// Fails immediately with [`SyncError::NotConnected`] if the link is
    /// down. Otherwise resolves with the response data, or fails with the
    /// companion's error, a timeout, or a transport error if the link
    /// drops first.
    pub async fn call(&self, method: Method, payload: Value) -> SyncResult<Value> {
        if !self.channel.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let rx = self.pending.register(&id);
        let _registration = Registration { pending: &self.pending, id: &id };

        debug!(%id, %method, in_flight = self.pending.len(), "calling companion");
        if self.channel.send(Request::new(id.as_str(), method, payload)).is_err() {
            return Err(SyncError::transport("channel closed"));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Reply::Response(response))) => response.into_result().map_err(SyncError::Remote),
            Ok(Ok(Reply::Disconnected(cause))) => Err(SyncError::Transport { cause }),
            Ok(Err(_)) => Err(SyncError::Transport { cause: None }),
            Err(_) => {
                debug!(%id, %method, "call timed out");
                Err(SyncError::Timeout { method: method.to_string(), timeout: self.timeout })
            }
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
