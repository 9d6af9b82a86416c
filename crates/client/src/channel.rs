// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background link management for the companion channel.
//!
//! A single task owns the [`Transport`]. It connects, pumps outbound
//! requests and inbound frames, and on loss of the link waits a fixed
//! delay before trying again, until [`Channel::destroy`] is called.
//! Responses are resolved straight into the [`PendingCalls`] table;
//! everything else reaches the owner as a [`ChannelEvent`].

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use psync_core::protocol::{CompanionEvent, Inbound, Request};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::rpc::PendingCalls;
use crate::transport::Transport;

/// Connection state values for the atomic state field.
pub const STATE_DISCONNECTED: u8 = 0;
pub const STATE_CONNECTING: u8 = 1;
pub const STATE_CONNECTED: u8 = 2;

/// Delay between reconnect attempts unless configured otherwise.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection state visible to both the link task and its callers.
///
/// Uses atomic fields for lock-free reads.
pub struct SharedConnectionState {
    state: AtomicU8,
}

impl SharedConnectionState {
    /// Create a new shared state initialized to disconnected.
    pub fn new() -> Self {
        Self { state: AtomicU8::new(STATE_DISCONNECTED) }
    }

    /// Get the current state.
    pub fn get(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Set the state.
    pub fn set(&self, state: u8) {
        self.state.store(state, Ordering::Release);
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.get() == STATE_CONNECTED
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events sent from the link task to the channel's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection attempt is starting.
    Connecting { attempt: u32 },
    /// The link is up.
    Connected,
    /// A connection attempt failed; another follows after the delay.
    ConnectFailed { attempt: u32, cause: String },
    /// An established link went away. `None` means a clean close.
    Disconnected { cause: Option<String> },
    /// An unsolicited frame from the companion.
    Notification(CompanionEvent),
    /// A frame that could not be decoded. The link stays up.
    Malformed { cause: String },
}

/// Configuration for the link task.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// URL to connect to.
    pub url: String,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
}

/// Cloneable handle for submitting requests to the link task.
#[derive(Clone)]
pub struct ChannelHandle {
    state: Arc<SharedConnectionState>,
    outbound: mpsc::UnboundedSender<Request>,
}

impl ChannelHandle {
    /// Check if the link is currently up.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Queue a request for the link task. Fails once the task has exited.
    pub fn send(&self, request: Request) -> Result<(), Request> {
        self.outbound.send(request).map_err(|e| e.0)
    }
}

/// Owns the background link task.
pub struct Channel {
    handle: ChannelHandle,
    cancel_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Channel {
    /// Spawn the link task. Must be called inside a tokio runtime.
    ///
    /// `factory` builds a fresh transport for every connection attempt.
    /// Returns the channel and a receiver for its events.
    pub fn spawn<T, F>(
        config: ChannelConfig,
        factory: F,
        pending: Arc<PendingCalls>,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>)
    where
        T: Transport + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(SharedConnectionState::new());
        let cancel_token = CancellationToken::new();

        let link = Link {
            config,
            state: Arc::clone(&state),
            pending,
            outbound: outbound_rx,
            events: event_tx,
            cancel_token: cancel_token.clone(),
        };
        let task = tokio::spawn(link.run(factory));

        let channel = Channel {
            handle: ChannelHandle { state, outbound: outbound_tx },
            cancel_token,
            task: Mutex::new(Some(task)),
        };
        (channel, event_rx)
    }

    /// Handle for submitting requests.
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    /// Stop the link task and close the connection. Idempotent.
    ///
    /// Calls already in flight are left to their own timeouts.
    pub fn destroy(&self) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        self.cancel_token.cancel();
        debug!("channel destroyed");
    }

    /// Wait for the link task to exit after [`destroy`](Self::destroy).
    pub async fn closed(&self) {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Why the pump loop returned.
enum PumpExit {
    Cancelled,
    Lost(Option<String>),
}

/// State owned by the link task.
struct Link {
    config: ChannelConfig,
    state: Arc<SharedConnectionState>,
    pending: Arc<PendingCalls>,
    outbound: mpsc::UnboundedReceiver<Request>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    cancel_token: CancellationToken,
}

impl Link {
    async fn run<T, F>(mut self, factory: F)
    where
        T: Transport,
        F: Fn() -> T,
    {
        let mut attempt = 0u32;

        while !self.cancel_token.is_cancelled() {
            attempt = attempt.saturating_add(1);
            self.state.set(STATE_CONNECTING);
            self.emit(ChannelEvent::Connecting { attempt });

            let mut transport = factory();
            let connect_result = tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                result = transport.connect(&self.config.url) => result,
            };

            match connect_result {
                Ok(()) => {
                    info!(url = %self.config.url, "connected to companion");
                    // Requests queued while the link was down were already failed
                    self.drain_outbound();
                    self.state.set(STATE_CONNECTED);
                    attempt = 0;
                    self.emit(ChannelEvent::Connected);

                    match self.pump(&mut transport).await {
                        PumpExit::Cancelled => {
                            let _ = transport.disconnect().await;
                            break;
                        }
                        PumpExit::Lost(cause) => {
                            self.state.set(STATE_DISCONNECTED);
                            let _ = transport.disconnect().await;
                            let failed = self.pending.fail_all(cause.clone());
                            self.drain_outbound();
                            warn!(cause = cause.as_deref().unwrap_or("closed"), failed, "companion link lost");
                            self.emit(ChannelEvent::Disconnected { cause });
                        }
                    }
                }
                Err(e) => {
                    self.state.set(STATE_DISCONNECTED);
                    debug!(attempt, error = %e, "connect attempt failed");
                    self.emit(ChannelEvent::ConnectFailed { attempt, cause: e.to_string() });
                }
            }

            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.state.set(STATE_DISCONNECTED);
        debug!("link task exited");
    }

    /// Move frames in both directions until the link drops or we are cancelled.
    async fn pump<T: Transport>(&mut self, transport: &mut T) -> PumpExit {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => return PumpExit::Cancelled,
                request = self.outbound.recv() => {
                    let Some(request) = request else {
                        return PumpExit::Cancelled;
                    };
                    debug!(id = %request.id, method = %request.kind, "sending request");
                    if let Err(e) = transport.send(request).await {
                        if e.is_fatal() {
                            return PumpExit::Lost(Some(e.to_string()));
                        }
                        warn!(error = %e, "dropping unsendable request");
                    }
                }
                inbound = transport.recv() => match inbound {
                    Ok(Some(Inbound::Response(response))) => {
                        let id = response.id.clone();
                        if !self.pending.resolve(response) {
                            debug!(%id, "no pending call for response");
                        }
                    }
                    Ok(Some(Inbound::Event(event))) => {
                        self.emit(ChannelEvent::Notification(event));
                    }
                    Ok(None) => return PumpExit::Lost(None),
                    Err(e) if e.is_fatal() => return PumpExit::Lost(Some(e.to_string())),
                    Err(e) => {
                        warn!(error = %e, "malformed frame from companion");
                        self.emit(ChannelEvent::Malformed { cause: e.to_string() });
                    }
                }
            }
        }
    }

    fn drain_outbound(&mut self) {
        while self.outbound.try_recv().is_ok() {}
    }

    fn emit(&self, event: ChannelEvent) {
        // The owner may already be gone during shutdown
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
