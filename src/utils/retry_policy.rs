// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

/// Backoff policy applied between failed fetch attempts.
///
/// The production configuration is a fixed backoff; exponential growth and
/// jitter stay available for callers that want them. Tests inject
/// [`RetryPolicy::zero_delay`] so retry chains run without sleeping.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts in one chain, including the first.
    pub max_attempts: u32,
    /// Backoff after the first failed attempt.
    pub initial_backoff: Duration,
    /// Ceiling on any computed backoff.
    pub max_backoff: Duration,
    /// Multiplier applied per attempt when exponential backoff is enabled.
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0-1.0) applied when jitter is enabled.
    pub jitter_factor: f64,
    pub exponential_backoff: bool,
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5), 3)
    }
}

impl RetryPolicy {
    /// Fixed backoff between attempts, the page-fetch default.
    pub fn fixed(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: backoff,
            max_backoff: backoff,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            exponential_backoff: false,
            enable_jitter: false,
        }
    }

    /// No delay between attempts. For tests.
    pub fn zero_delay(max_attempts: u32) -> Self {
        Self::fixed(Duration::ZERO, max_attempts)
    }

    /// Exponential backoff with jitter, for callers talking to flaky hosts.
    pub fn exponential(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: initial,
            max_backoff: max,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }

    /// Backoff to sleep after the given failed attempt (1-based).
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.initial_backoff;
        }

        let backoff_secs = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());

        let final_backoff = if self.enable_jitter && self.jitter_factor > 0.0 {
            let jitter_range = capped * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// Whether another attempt is allowed after `attempt` attempts have run.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
