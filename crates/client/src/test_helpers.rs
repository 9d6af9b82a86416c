// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: fixtures and a scripted in-memory companion.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use psync_core::protocol::{CompanionEvent, Inbound, Method, Request, Response};
use psync_core::store::read_snapshot;
use psync_core::{Collections, ManualClock, MemoryStore, Record, Settings, Snapshot, Source};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::config::SyncConfig;
use crate::events::{EventKind, SyncEvent};
use crate::orchestrator::SyncOrchestrator;
use crate::transport::{Transport, TransportError, TransportFuture};

/// Timestamp from milliseconds since the epoch.
pub fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

/// A prompt record with a title.
pub fn prompt(id: &str, title: &str, updated_ms: i64) -> Record {
    Record::new(id, at(updated_ms)).with_field("title", title)
}

/// A snapshot holding only `prompts`.
pub fn snapshot(source: Source, last_modified_ms: i64, prompts: Vec<Record>) -> Snapshot {
    let mut records = Collections::new();
    records.insert("prompts".to_string(), prompts);
    Snapshot::new(source, at(last_modified_ms), records, Settings::new())
}

/// Poll `cond` until it holds. Advances paused time in small steps.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cond(), "condition not reached");
}

enum Frame {
    Text(String),
    Close,
}

#[derive(Default)]
struct CompanionState {
    snapshot: Mutex<Option<Snapshot>>,
    requests: Mutex<Vec<Request>>,
    link: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    silent: AtomicBool,
    refuse_connect: AtomicBool,
    reject_writes: AtomicBool,
    connects: AtomicU32,
    response_delay: Mutex<Option<Duration>>,
    reads_in_flight: AtomicU32,
    max_reads_in_flight: AtomicU32,
}

impl CompanionState {
    fn respond(&self, request: &Request) -> Option<Response> {
        if self.silent.load(Ordering::SeqCst) {
            return None;
        }
        let id = request.id.clone();
        let response = match request.method() {
            Ok(Method::GetData) => match self.snapshot.lock().unwrap().as_ref() {
                Some(snapshot) => Response::ok(id, serde_json::to_value(snapshot).unwrap()),
                None => Response::error(id, "no data"),
            },
            Ok(Method::SetData) if self.reject_writes.load(Ordering::SeqCst) => {
                Response::error(id, "write rejected")
            }
            Ok(Method::SetData) => match serde_json::from_value::<Snapshot>(request.payload.clone())
            {
                Ok(snapshot) => {
                    *self.snapshot.lock().unwrap() = Some(snapshot);
                    Response::ok(id, Value::Null)
                }
                Err(e) => Response::error(id, e.to_string()),
            },
            Ok(Method::Ping) => Response::ok(id, json!("pong")),
            Err(e) => Response::error(id, e.to_string()),
        };
        Some(response)
    }

    fn begin_read(&self) {
        let now = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_reads_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn end_read(&self) {
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn push(&self, frame: Frame) -> bool {
        match self.link.lock().unwrap().as_ref() {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }
}

/// An in-memory companion answering getData/setData/ping.
///
/// Every transport it hands out talks to the same shared state, so it
/// survives reconnects the way a real companion process would.
#[derive(Clone, Default)]
pub struct MockCompanion {
    state: Arc<CompanionState>,
}

impl MockCompanion {
    pub fn new(snapshot: Snapshot) -> Self {
        let companion = Self::default();
        companion.set_snapshot(snapshot);
        companion
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.state.snapshot.lock().unwrap() = Some(snapshot);
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.state.snapshot.lock().unwrap().clone()
    }

    pub fn transport(&self) -> MockTransport {
        MockTransport { companion: Arc::clone(&self.state), link: None }
    }

    /// Transport factory for [`Channel::spawn`](crate::channel::Channel::spawn).
    pub fn factory(&self) -> impl Fn() -> MockTransport + Send + Sync + 'static {
        let companion = self.clone();
        move || companion.transport()
    }

    /// Accept requests but never answer them.
    pub fn set_silent(&self, silent: bool) {
        self.state.silent.store(silent, Ordering::SeqCst);
    }

    pub fn set_refuse_connect(&self, refuse: bool) {
        self.state.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    /// Answer setData with an error.
    pub fn set_reject_writes(&self, reject: bool) {
        self.state.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_of(&self, method: Method) -> Vec<Request> {
        self.requests().into_iter().filter(|r| r.method().ok() == Some(method)).collect()
    }

    pub fn connects(&self) -> u32 {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Answer every request after `delay` instead of right away.
    pub fn set_response_delay(&self, delay: Option<Duration>) {
        *self.state.response_delay.lock().unwrap() = delay;
    }

    /// Most getData requests ever awaiting an answer at the same time.
    pub fn max_concurrent_reads(&self) -> u32 {
        self.state.max_reads_in_flight.load(Ordering::SeqCst)
    }

    /// Push an unsolicited event on the current link.
    pub fn push_event(&self, event: CompanionEvent) -> bool {
        self.state.push(Frame::Text(event.to_json().unwrap()))
    }

    /// Push a raw text frame on the current link.
    pub fn push_text(&self, text: &str) -> bool {
        self.state.push(Frame::Text(text.to_string()))
    }

    /// Close the current link from the companion side.
    pub fn drop_link(&self) -> bool {
        let link = self.state.link.lock().unwrap().take();
        link.is_some_and(|tx| tx.send(Frame::Close).is_ok())
    }
}

/// Transport handed out by [`MockCompanion`].
pub struct MockTransport {
    companion: Arc<CompanionState>,
    link: Option<(mpsc::UnboundedSender<Frame>, mpsc::UnboundedReceiver<Frame>)>,
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if self.companion.refuse_connect.load(Ordering::SeqCst) {
                return Err(TransportError::ConnectionFailed("connection refused".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            *self.companion.link.lock().unwrap() = Some(tx.clone());
            self.companion.connects.fetch_add(1, Ordering::SeqCst);
            self.link = Some((tx, rx));
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some((tx, _)) = self.link.take() {
                let mut current = self.companion.link.lock().unwrap();
                if current.as_ref().is_some_and(|c| c.same_channel(&tx)) {
                    *current = None;
                }
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: Request) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let (tx, _) = self.link.as_ref().ok_or(TransportError::ConnectionClosed)?;
            let tx = tx.clone();
            let companion = Arc::clone(&self.companion);
            companion.requests.lock().unwrap().push(msg.clone());
            let is_read = msg.method().ok() == Some(Method::GetData);
            if is_read {
                companion.begin_read();
            }
            let delay = *companion.response_delay.lock().unwrap();
            let answer = async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if let Some(response) = companion.respond(&msg) {
                    let _ = tx.send(Frame::Text(response.to_json().unwrap()));
                }
                if is_read {
                    companion.end_read();
                }
            };
            match delay {
                Some(_) => {
                    tokio::spawn(answer);
                }
                None => answer.await,
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<Inbound>> {
        Box::pin(async move {
            let (_, rx) = self.link.as_mut().ok_or(TransportError::ConnectionClosed)?;
            match rx.recv().await {
                Some(Frame::Text(text)) => Inbound::from_json(&text)
                    .map(Some)
                    .map_err(|e| TransportError::SerializationError(e.to_string())),
                Some(Frame::Close) | None => {
                    self.link = None;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// An orchestrator wired to a [`MockCompanion`], a memory store and a
/// manual clock, recording every event it emits.
pub struct Harness {
    pub companion: MockCompanion,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub orchestrator: SyncOrchestrator,
    pub events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl Harness {
    /// Test configuration: mock URL, auto-sync off.
    pub fn config() -> SyncConfig {
        SyncConfig {
            url: "ws://companion.test".into(),
            auto_sync_interval: None,
            ..SyncConfig::default()
        }
    }

    /// Build the orchestrator without waiting for the link.
    pub fn start(companion: MockCompanion, store: MemoryStore, config: SyncConfig) -> Self {
        let store = Arc::new(store);
        let clock = Arc::new(ManualClock::new(at(100_000)));
        let orchestrator = SyncOrchestrator::with_transport(
            config,
            store.clone(),
            clock.clone(),
            companion.factory(),
        );

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        orchestrator.subscribe_all(move |event| sink.lock().unwrap().push(event.clone()));

        Harness { companion, store, clock, orchestrator, events }
    }

    /// Build with `config` and wait until connected.
    pub async fn connected_with(
        companion: MockCompanion,
        store: MemoryStore,
        config: SyncConfig,
    ) -> Self {
        let harness = Self::start(companion, store, config);
        harness.orchestrator.wait_connected(Duration::from_secs(1)).await.unwrap();
        harness
    }

    /// Build with the test configuration and wait until connected.
    pub async fn connected(companion: MockCompanion, store: MemoryStore) -> Self {
        Self::connected_with(companion, store, Self::config()).await
    }

    pub fn events_of(&self, kind: EventKind) -> Vec<SyncEvent> {
        self.events.lock().unwrap().iter().filter(|e| e.kind() == kind).cloned().collect()
    }

    /// Current local store content as a snapshot.
    pub fn local(&self) -> Snapshot {
        let collections = &self.orchestrator.config().collections;
        read_snapshot(&*self.store, collections, Source::Extension).unwrap()
    }
}
