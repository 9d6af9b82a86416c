// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic auto-sync timer.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shortest accepted interval; shorter requests are raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

struct Running {
    cancel_token: CancellationToken,
    interval: Duration,
}

/// Runs a tick function on a fixed interval.
///
/// Ticks never overlap: the next tick is not scheduled until the current
/// one has finished, and a late tick is delayed rather than bunched up.
/// Stopping the timer lets a tick already in progress run to completion.
#[derive(Default)]
pub struct AutoSync {
    running: Mutex<Option<Running>>,
}

impl AutoSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `interval`, replacing any running timer.
    ///
    /// The first tick fires one interval from now. Must be called inside a
    /// tokio runtime.
    pub fn start<F, Fut>(&self, interval: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let cancel_token = CancellationToken::new();
        let previous = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(Running { cancel_token: cancel_token.clone(), interval });
        if let Some(previous) = previous {
            previous.cancel_token.cancel();
        }

        debug!(interval_ms = interval.as_millis() as u64, "auto-sync started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tick().await;
            }
        });
    }

    /// Stop the timer. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner()).take();
        match running {
            Some(running) => {
                running.cancel_token.cancel();
                debug!("auto-sync stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Interval of the running timer, if any.
    pub fn interval(&self) -> Option<Duration> {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|r| r.interval)
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
