// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-caller sliding-window limiter for generation requests

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct LimiterState {
    callers: HashMap<String, Vec<Instant>>,
    last_sweep: Instant,
}

/// Per-caller sliding-window rate limiter
pub struct ImageGenerationRateLimiter {
    state: RwLock<LimiterState>,
    max_per_window: usize,
    window: Duration,
}

impl ImageGenerationRateLimiter {
    /// 60-second window
    pub fn new(max_per_minute: usize) -> Self {
        Self::with_window(max_per_minute, Duration::from_secs(60))
    }

    pub fn with_window(max_per_window: usize, window: Duration) -> Self {
        Self {
            state: RwLock::new(LimiterState {
                callers: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            max_per_window,
            window,
        }
    }

    /// Record a request if the caller is within its limit, otherwise return
    /// how long until the oldest request leaves the window.
    pub fn try_acquire(&self, caller: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        // Callers with nothing left in the window are dropped, at most once per window
        if now.duration_since(state.last_sweep) >= self.window {
            let window = self.window;
            state.callers.retain(|_, timestamps| {
                timestamps.retain(|&t| now.duration_since(t) < window);
                !timestamps.is_empty()
            });
            state.last_sweep = now;
        }

        let timestamps = state.callers.entry(caller.to_string()).or_default();
        timestamps.retain(|&t| now.duration_since(t) < self.window);

        if timestamps.len() >= self.max_per_window {
            let oldest = timestamps.first().copied();
            if timestamps.is_empty() {
                state.callers.remove(caller);
            }
            let oldest = oldest.unwrap_or(now);
            return Err(self.window.saturating_sub(now.duration_since(oldest)));
        }
        timestamps.push(now);
        Ok(())
    }

    /// Requests still inside the window for a caller
    pub fn in_flight_window(&self, caller: &str) -> usize {
        let now = Instant::now();
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state
            .callers
            .get(caller)
            .map(|ts| {
                ts.iter()
                    .filter(|&&t| now.duration_since(t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of callers currently holding an entry
    pub fn tracked_callers(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.callers.len()
    }
}
