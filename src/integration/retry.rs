//! Bounded retry with exponential backoff for acquiring external resources.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Delay before the second attempt.
    pub delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(500),
            backoff: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

/// All attempts failed; carries the last error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay slept after the failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let nanos = (self.delay.as_nanos() as f64 * factor) as u64;
        Duration::from_nanos(nanos).min(self.max_delay)
    }

    /// Call `op` with the 1-based attempt number until it succeeds or the
    /// attempts run out.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => {
                    return Err(RetryExhausted {
                        attempts,
                        last_error: err,
                    });
                }
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    warn!(%err, attempt, attempts, ?delay, "{what} failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
