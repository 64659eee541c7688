//! Caller-owned cancellation: an explicit token plus an optional deadline.
//!
//! The retry loop only observes a [`CancelSignal`]; it never cancels one.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a call was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CancelReason {
    /// The token was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,
    /// The deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cloneable handle combining a [`CancellationToken`] and an optional deadline.
///
/// Clones share the same token, so cancelling any clone (or the token the
/// signal was built from) is observed by all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A fresh signal that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Same token, with a deadline at `deadline`. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Deadline `timeout` from now. A timeout too large to represent leaves
    /// the signal without a new deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Non-blocking check. Explicit cancellation is reported before an
    /// expired deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves once the signal is cancelled or its deadline passes.
    pub async fn cancelled(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => CancelReason::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }

    /// Sleep for `duration` unless the signal fires first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), CancelReason> {
        if let Some(reason) = self.reason() {
            return Err(reason);
        }
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            reason = self.cancelled() => Err(reason),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

impl From<CancellationToken> for CancelSignal {
    fn from(token: CancellationToken) -> Self {
        Self::from_token(token)
    }
}
