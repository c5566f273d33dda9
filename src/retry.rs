//! Reconnect retry policies.
//!
//! The connection manager asks its policy for a delay every time a
//! session ends. `attempt` counts consecutive closes since the last
//! successful open, starting at 1; the manager calls
//! [`RetryPolicy::reset`] whenever a session opens.
//!
//! Returning `None` stops the manager.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use socket_feed::{ExponentialBackoff, FixedDelay};
//!
//! // Reconnect every 5s forever (default).
//! let fixed = FixedDelay::default();
//!
//! // 100ms, 200ms, 400ms ... capped at 5s, give up after 10 tries.
//! let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(5))
//!     .with_max_attempts(10);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Delay between a close and the next connect attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Default growth factor for [`ExponentialBackoff`].
const DEFAULT_MULTIPLIER: f64 = 2.0;

// ============================================================================
// RetryPolicy
// ============================================================================

/// Decides when to reconnect after a close.
pub trait RetryPolicy: Send + 'static {
    /// Returns the delay before attempt number `attempt`, or `None` to stop.
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Called when a session opens successfully.
    fn reset(&mut self) {}
}

impl RetryPolicy for Box<dyn RetryPolicy> {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        (**self).next_delay(attempt)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Returns `true` once `attempt` goes past an optional cap.
#[inline]
fn exhausted(max_attempts: Option<u32>, attempt: u32) -> bool {
    max_attempts.is_some_and(|max| attempt > max)
}

// ============================================================================
// FixedDelay
// ============================================================================

/// Same delay before every attempt.
///
/// Unbounded unless [`FixedDelay::with_max_attempts`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    /// Creates an unbounded fixed-delay policy.
    #[inline]
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Caps the number of consecutive reconnect attempts.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Returns the configured delay.
    #[inline]
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy for FixedDelay {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        if exhausted(self.max_attempts, attempt) {
            return None;
        }
        Some(self.delay)
    }
}

// ============================================================================
// ExponentialBackoff
// ============================================================================

/// Delay growing by `multiplier` per attempt, clamped to `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    max_attempts: Option<u32>,
}

impl ExponentialBackoff {
    /// Creates an unbounded doubling backoff.
    #[inline]
    #[must_use]
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            multiplier: DEFAULT_MULTIPLIER,
            max_attempts: None,
        }
    }

    /// Sets the growth factor. Values below 1.0 are treated as 1.0.
    #[inline]
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Caps the number of consecutive reconnect attempts.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        if exhausted(self.max_attempts, attempt) {
            return None;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = if secs.is_finite() && secs < self.max.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };
        Some(delay)
    }
}

// ============================================================================
// Tests
// ============================================================================
