//! Retry loop: run an async operation until success, exhaustion, or cancellation.

use super::cancel::CancelSignal;
use super::classify;
use super::error::{AttemptError, ClassifiedError, RetryError};
use super::policy::{RetryDecision, RetryPolicy};
use crate::events::{Event, EventSink, NoopSink};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type RetryHook<'a> = &'a mut (dyn FnMut(u32, &ClassifiedError, Duration) + Send);

/// Drives repeated attempts of a caller-supplied operation under a [`RetryPolicy`].
///
/// Holds no per-call state: each `execute_*` call has its own attempt counter,
/// so one controller can serve many concurrent calls.
#[derive(Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(NoopSink))
    }
}

impl RetryController {
    pub fn new(policy: RetryPolicy, sink: Arc<dyn EventSink>) -> Self {
        Self {
            policy: policy.normalized(),
            sink,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` with retries.
    ///
    /// The operation gets a clone of `cancel` on every attempt. Failures it
    /// returns as [`AttemptError::Raw`] are classified here; already
    /// classified failures are used as-is. Cancellation observed before an
    /// attempt, after a failed attempt, or during a backoff wait is returned
    /// as [`RetryError::Cancelled`].
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        cancel: &CancelSignal,
        operation: F,
        operation_name: &str,
    ) -> Result<T, RetryError>
    where
        F: FnMut(CancelSignal) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        self.run(cancel, operation, operation_name, None).await
    }

    /// Like [`execute_with_retry`](Self::execute_with_retry), calling
    /// `on_retry(attempt, error, delay)` before each backoff wait. It is never
    /// called on success or on the final failure.
    pub async fn execute_with_retry_notify<T, F, Fut, H>(
        &self,
        cancel: &CancelSignal,
        operation: F,
        operation_name: &str,
        mut on_retry: H,
    ) -> Result<T, RetryError>
    where
        F: FnMut(CancelSignal) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
        H: FnMut(u32, &ClassifiedError, Duration) + Send,
    {
        self.run(cancel, operation, operation_name, Some(&mut on_retry))
            .await
    }

    async fn run<T, F, Fut>(
        &self,
        cancel: &CancelSignal,
        mut operation: F,
        operation_name: &str,
        mut on_retry: Option<RetryHook<'_>>,
    ) -> Result<T, RetryError>
    where
        F: FnMut(CancelSignal) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let mut attempt = 1u32;
        loop {
            if let Some(reason) = cancel.reason() {
                tracing::debug!(operation_name, attempt, %reason, "cancelled before attempt");
                return Err(RetryError::Cancelled(reason));
            }

            let failure = match operation(cancel.clone()).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation_name, attempts = attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            // An attempt that failed because the caller gave up reports the cancellation.
            if let Some(reason) = cancel.reason() {
                return Err(RetryError::Cancelled(reason));
            }

            let err = match failure {
                AttemptError::Classified(err) => err,
                AttemptError::Raw(raw) => classify::classify(raw, operation_name, None),
            };

            match self.policy.decide(attempt, &err) {
                RetryDecision::NoRetry => {
                    self.sink.record(&Event::FinalFailure {
                        operation_name: operation_name.to_string(),
                        attempt,
                        max_attempts: self.policy.max_attempts,
                        error_type: err.kind(),
                        error_message: err.message().to_string(),
                        retryable: err.is_retryable(),
                        status_code: err.status_code(),
                    });
                    return Err(RetryError::Failed(err));
                }
                RetryDecision::RetryAfter(delay) => {
                    if let Some(hook) = on_retry.as_deref_mut() {
                        hook(attempt, &err, delay);
                    }
                    self.sink.record(&Event::RetryScheduled {
                        operation_name: operation_name.to_string(),
                        attempt,
                        max_attempts: self.policy.max_attempts,
                        error_type: err.kind(),
                        error_message: err.message().to_string(),
                        delay,
                    });
                    if let Err(reason) = cancel.sleep(delay).await {
                        tracing::debug!(operation_name, attempt, %reason, "cancelled during backoff");
                        return Err(RetryError::Cancelled(reason));
                    }
                    attempt += 1;
                }
            }
        }
    }
}
