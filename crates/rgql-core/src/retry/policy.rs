use super::error::ClassifiedError;
use rand::Rng;
use std::time::Duration;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with a ceiling and optional jitter.
///
/// Construct through [`RetryPolicy::new`] or `Default`, or call
/// [`RetryPolicy::normalized`] after editing fields: out-of-range values are
/// replaced with safe defaults rather than rejected. The policy is read-only
/// while a call runs, so one instance can be shared by concurrent calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// When false every failure is terminal.
    pub enabled: bool,
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Ceiling applied before jitter.
    pub max_delay: Duration,
    /// Growth factor per retry.
    pub exponential_base: f64,
    /// Scale each delay by a random factor in `[0.5, 1.5)`.
    pub jitter: bool,
}

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_EXPONENTIAL_BASE: f64 = 2.0;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            exponential_base: DEFAULT_EXPONENTIAL_BASE,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        enabled: bool,
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        exponential_base: f64,
        jitter: bool,
    ) -> Self {
        Self {
            enabled,
            max_attempts,
            initial_delay,
            max_delay,
            exponential_base,
            jitter,
        }
        .normalized()
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Replace out-of-range values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_attempts < 1 {
            self.max_attempts = 1;
        }
        if self.max_delay < self.initial_delay {
            self.max_delay = DEFAULT_MAX_DELAY;
        }
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            self.exponential_base = DEFAULT_EXPONENTIAL_BASE;
        }
        self
    }

    /// Delay before the retry that follows failure number `index + 1`.
    ///
    /// `initial_delay * base^index`, clamped to `max_delay`, then jittered.
    /// Jitter comes after the clamp, so with jitter on the result can reach
    /// up to 1.5x `max_delay`.
    pub fn calculate_delay(&self, index: u32) -> Duration {
        let clamped = self.clamped_delay(index);
        if self.jitter {
            let factor: f64 = rand::rng().random_range(0.5..1.5);
            // Saturate: a huge max_delay times 1.5 does not fit in a Duration.
            Duration::try_from_secs_f64(clamped.as_secs_f64() * factor).unwrap_or(Duration::MAX)
        } else {
            clamped
        }
    }

    /// Backoff before jitter: `min(initial_delay * base^index, max_delay)`.
    pub fn clamped_delay(&self, index: u32) -> Duration {
        let raw = self.initial_delay.as_secs_f64() * self.exponential_base.powf(f64::from(index));
        let max = self.max_delay.as_secs_f64();
        if raw.is_nan() {
            // 0 * inf
            return Duration::ZERO;
        }
        if raw >= max {
            self.max_delay
        } else {
            Duration::from_secs_f64(raw.max(0.0))
        }
    }

    /// `attempt` is 1-based (1 = first attempt).
    pub fn should_retry(&self, err: &ClassifiedError, attempt: u32) -> bool {
        self.enabled && err.is_retryable() && attempt < self.max_attempts
    }

    /// Combine [`should_retry`](Self::should_retry) and
    /// [`calculate_delay`](Self::calculate_delay) for a 1-based attempt.
    pub fn decide(&self, attempt: u32, err: &ClassifiedError) -> RetryDecision {
        if !self.should_retry(err, attempt) {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.calculate_delay(attempt.saturating_sub(1)))
    }
}
