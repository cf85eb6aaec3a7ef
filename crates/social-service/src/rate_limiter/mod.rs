//! Fixed-window, per-client admission control.
//!
//! Each client key gets a window anchored at the first request seen for it.
//! The window does not slide: requests inside it only bump the counter, and
//! the key is dropped `time_frame` after the window opened. Once the counter
//! reaches the limit every further request in that window is rejected with a
//! retry hint equal to the full time frame.
//!
//! Single-process only; every replica keeps its own counters.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    count: u32,
    started_at: Instant,
}

/// Shared fixed-window limiter. Cloning shares the counters.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    clients: Arc<Mutex<HashMap<String, ClientWindow>>>,
    limit: u32,
    time_frame: Duration,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, time_frame: Duration) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            limit,
            time_frame,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_time_frame, config.time_frame)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn time_frame(&self) -> Duration {
        self.time_frame
    }

    /// Admit or reject one request from `key`.
    ///
    /// Returns `(true, Duration::ZERO)` when admitted and
    /// `(false, time_frame)` when the window is exhausted.
    pub async fn allow(&self, key: &str) -> (bool, Duration) {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        let mut opened = false;
        let window = clients.entry(key.to_string()).or_insert_with(|| {
            opened = true;
            ClientWindow {
                count: 0,
                started_at: now,
            }
        });

        // The expiry task may not have run yet if the runtime is busy.
        if !opened && now.duration_since(window.started_at) >= self.time_frame {
            *window = ClientWindow {
                count: 0,
                started_at: now,
            };
            opened = true;
        }

        let decision = if window.count < self.limit {
            window.count += 1;
            (true, Duration::ZERO)
        } else {
            debug!(
                target: "social.ratelimit",
                count = window.count,
                limit = self.limit,
                "Client window exhausted"
            );
            (false, self.time_frame)
        };

        let started_at = window.started_at;
        drop(clients);

        if opened {
            self.schedule_expiry(key.to_string(), started_at);
        }
        decision
    }

    /// Remove `key` once its window has run for `time_frame`, unless a newer
    /// window replaced it in the meantime.
    fn schedule_expiry(&self, key: String, started_at: Instant) {
        let clients = Arc::clone(&self.clients);
        let time_frame = self.time_frame;

        tokio::spawn(async move {
            tokio::time::sleep_until(started_at + time_frame).await;
            let mut clients = clients.lock().await;
            if clients
                .get(&key)
                .is_some_and(|w| w.started_at == started_at)
            {
                clients.remove(&key);
            }
        });
    }

    /// Number of client keys with an open window.
    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
