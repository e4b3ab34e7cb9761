//! Per-client sliding-window rate limiting.
//!
//! Each client identity keeps the timestamps of its admitted requests inside
//! the current window. The lock is only held for the bookkeeping of one check
//! and never across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Outcome of an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: usize,
    pub remaining: usize,
}

/// Current usage of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientUsage {
    pub current_requests: usize,
    pub limit: usize,
    pub remaining: usize,
}

/// Sliding-window limiter allowing `calls` requests per `period` per client.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    calls: usize,
    period: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(calls: usize, period: Duration) -> Self {
        Self {
            calls,
            period,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject a request from `client` now.
    pub fn check(&self, client: &str) -> AppResult<RateLimitStatus> {
        self.check_at(client, Instant::now())
    }

    /// Admit or reject a request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> AppResult<RateLimitStatus> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(client.to_string()).or_default();
        evict_expired(window, now, self.period);

        if window.len() >= self.calls {
            let retry_after = window
                .front()
                .map(|oldest| self.period.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.period);
            tracing::warn!("Rate limit exceeded for {}", client);
            return Err(AppError::RateLimited {
                client: client.to_string(),
                retry_after_secs: ceil_secs(retry_after),
            });
        }

        window.push_back(now);
        Ok(RateLimitStatus {
            limit: self.calls,
            remaining: self.calls - window.len(),
        })
    }

    /// Usage per client, with expired entries dropped.
    pub fn stats(&self) -> HashMap<String, ClientUsage> {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        windows
            .iter_mut()
            .map(|(client, window)| {
                evict_expired(window, now, self.period);
                let usage = ClientUsage {
                    current_requests: window.len(),
                    limit: self.calls,
                    remaining: self.calls.saturating_sub(window.len()),
                };
                (client.clone(), usage)
            })
            .collect()
    }
}

fn evict_expired(window: &mut VecDeque<Instant>, now: Instant, period: Duration) {
    while let Some(oldest) = window.front() {
        if now.duration_since(*oldest) >= period {
            window.pop_front();
        } else {
            break;
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}
