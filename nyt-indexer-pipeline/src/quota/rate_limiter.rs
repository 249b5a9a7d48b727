//! Per-minute rate limiting and daily quota tracking.
//!
//! The limiter itself is stateless apart from its clock. The counters live
//! in [`QuotaState`], owned by the run and passed in by `&mut`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::quota::clock::Clock;

/// Length of the rate limiting window.
pub const MINUTE: Duration = Duration::from_secs(60);

/// Published call limits of the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub max_calls_per_minute: u32,
    pub max_calls_per_day: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_calls_per_minute: 5,
            max_calls_per_day: 500,
        }
    }
}

/// Call counters of one run. Not persisted: a restart resets them.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaState {
    /// External calls performed since the run started.
    pub calls_this_run: u32,
    /// External calls performed in the current window.
    pub calls_this_minute: u32,
    /// Start of the current window; `None` until the first call.
    pub minute_window_start: Option<Instant>,
    pub max_calls_per_day: u32,
    pub max_calls_per_minute: u32,
}

impl QuotaState {
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            calls_this_run: 0,
            calls_this_minute: 0,
            minute_window_start: None,
            max_calls_per_day: limits.max_calls_per_day,
            max_calls_per_minute: limits.max_calls_per_minute,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.calls_this_run >= self.max_calls_per_day
    }

    pub fn remaining_today(&self) -> u32 {
        self.max_calls_per_day.saturating_sub(self.calls_this_run)
    }

    fn reset_window(&mut self) {
        self.calls_this_minute = 0;
        self.minute_window_start = None;
    }
}

/// Gate in front of every external API call.
#[derive(Clone)]
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter with a one-minute window.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            window: MINUTE,
        }
    }

    /// Wait until a call is allowed.
    ///
    /// Suspends while the current window is full.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The caller may perform one external call
    /// * `Err(PipelineError::QuotaExhausted)` - The daily cap is reached; the call must not happen
    pub async fn acquire(&self, state: &mut QuotaState) -> Result<(), PipelineError> {
        if state.is_exhausted() {
            warn!(
                calls_made = state.calls_this_run,
                max_calls_per_day = state.max_calls_per_day,
                "Daily API quota exhausted"
            );
            return Err(PipelineError::QuotaExhausted {
                calls_made: state.calls_this_run,
                max_calls_per_day: state.max_calls_per_day,
            });
        }

        let now = self.clock.now();
        if let Some(start) = state.minute_window_start {
            if now.duration_since(start) >= self.window {
                state.reset_window();
            }
        }

        if state.calls_this_minute >= state.max_calls_per_minute {
            if let Some(start) = state.minute_window_start {
                let deadline = start + self.window;
                info!(
                    calls_this_minute = state.calls_this_minute,
                    wait_ms = deadline.saturating_duration_since(now).as_millis() as u64,
                    "Per-minute limit reached, waiting for the window to roll over"
                );
                self.clock.sleep_until(deadline).await;
            }
            state.reset_window();
        }

        Ok(())
    }

    /// Count one performed external call, successful or not.
    pub fn record_call(&self, state: &mut QuotaState) {
        if state.minute_window_start.is_none() {
            state.minute_window_start = Some(self.clock.now());
        }
        state.calls_this_run += 1;
        state.calls_this_minute += 1;

        debug!(
            calls_this_run = state.calls_this_run,
            calls_this_minute = state.calls_this_minute,
            "Recorded API call"
        );
    }
}
