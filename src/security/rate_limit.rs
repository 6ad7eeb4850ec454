//! Per-client sliding window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::time;

use crate::config::RateLimitConfig;
use crate::lifecycle::Shutdown;

type Windows = HashMap<String, VecDeque<Instant>>;

/// Sliding window limiter keyed by client.
///
/// Each key keeps the arrival times of its admitted requests, oldest first.
/// A request is admitted when fewer than `max_requests` of those fall inside
/// the trailing `window`. Rejected requests are not recorded.
///
/// The whole table sits behind one mutex, so check-and-record is atomic for
/// every key.
pub struct RateLimiter {
    windows: Mutex<Windows>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests: max_requests as usize,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    /// Check and record a request from `key` arriving now.
    pub fn check(&self, key: &str) -> bool {
        let mut windows = self.lock();
        // Read the clock under the lock so timestamps stay ordered per key.
        let now = Instant::now();
        self.admit(&mut windows, key, now)
    }

    /// Check and record a request from `key` arriving at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.lock();
        self.admit(&mut windows, key, now)
    }

    /// Drop clients whose every recorded request has left the window.
    /// Returns how many keys were removed.
    pub fn sweep(&self) -> usize {
        let mut windows = self.lock();
        let now = Instant::now();
        self.sweep_locked(&mut windows, now)
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.lock();
        self.sweep_locked(&mut windows, now)
    }

    /// Number of clients currently holding window state.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Sweep once per window until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, shutdown: Shutdown) {
        let mut ticker = time::interval(self.window);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Swept idle rate limit windows");
                    }
                }
                () = shutdown.wait() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self, windows: &mut Windows, key: &str, now: Instant) -> bool {
        let stamps = windows.entry(key.to_owned()).or_default();
        self.prune(stamps, now);

        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push_back(now);
        true
    }

    fn prune(&self, stamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = stamps.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            stamps.pop_front();
        }
    }

    fn sweep_locked(&self, windows: &mut Windows, now: Instant) -> usize {
        let before = windows.len();
        windows.retain(|_, stamps| {
            self.prune(stamps, now);
            !stamps.is_empty()
        });
        before - windows.len()
    }
}
