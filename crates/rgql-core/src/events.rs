//! Structured events emitted by the client and the retry loop, and the sinks
//! that receive them.
//!
//! A sink is injected where it is used (controller, client); there is no
//! process-wide logger. [`TracingSink`] forwards events to `tracing`.

use crate::retry::{ErrorKind, Variables};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Header names whose values never reach a log.
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key", "x-auth-token"];

const REDACTED: &str = "***";

fn millis(d: &Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(millis(d))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An HTTP attempt is about to be sent.
    #[serde(rename = "REQUEST")]
    RequestStarted {
        operation_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        variables: Option<Variables>,
        /// Already redacted.
        headers: BTreeMap<String, String>,
    },
    /// An HTTP response (success or not) came back.
    #[serde(rename = "RESPONSE")]
    ResponseReceived {
        operation_name: String,
        #[serde(rename = "duration_ms", serialize_with = "as_millis")]
        duration: Duration,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        has_error: bool,
    },
    /// An attempt failed and another one will follow after `delay`.
    #[serde(rename = "RETRY")]
    RetryScheduled {
        operation_name: String,
        attempt: u32,
        max_attempts: u32,
        error_type: ErrorKind,
        error_message: String,
        #[serde(rename = "retry_delay_ms", serialize_with = "as_millis")]
        delay: Duration,
    },
    /// The call gave up; the error is returned to the caller.
    #[serde(rename = "ERROR")]
    FinalFailure {
        operation_name: String,
        attempt: u32,
        max_attempts: u32,
        error_type: ErrorKind,
        error_message: String,
        retryable: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },
}

impl Event {
    pub fn operation_name(&self) -> &str {
        match self {
            Event::RequestStarted { operation_name, .. }
            | Event::ResponseReceived { operation_name, .. }
            | Event::RetryScheduled { operation_name, .. }
            | Event::FinalFailure { operation_name, .. } => operation_name,
        }
    }
}

/// Receiver for [`Event`]s. Shared across concurrent calls, so it must be
/// `Send + Sync`.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn record(&self, event: &Event) {
        self(event)
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: &Event) {}
}

/// Forwards events to `tracing` under the `rgql::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &Event) {
        match event {
            Event::RequestStarted {
                operation_name,
                variables,
                headers,
            } => {
                tracing::info!(
                    target: "rgql::events",
                    operation_name = %operation_name,
                    variables = ?variables,
                    headers = ?headers,
                    "graphql request: {}",
                    operation_name
                );
            }
            Event::ResponseReceived {
                operation_name,
                duration,
                status_code,
                has_error,
            } => {
                let duration_ms = millis(duration);
                if *has_error {
                    tracing::warn!(
                        target: "rgql::events",
                        operation_name = %operation_name,
                        duration_ms,
                        status_code = ?status_code,
                        "graphql request failed: {} ({}ms)",
                        operation_name,
                        duration_ms
                    );
                } else {
                    tracing::info!(
                        target: "rgql::events",
                        operation_name = %operation_name,
                        duration_ms,
                        status_code = ?status_code,
                        "graphql request done: {} ({}ms)",
                        operation_name,
                        duration_ms
                    );
                }
            }
            Event::RetryScheduled {
                operation_name,
                attempt,
                max_attempts,
                error_type,
                error_message,
                delay,
            } => {
                tracing::warn!(
                    target: "rgql::events",
                    operation_name = %operation_name,
                    attempt,
                    max_attempts,
                    error_type = %error_type,
                    error_message = %error_message,
                    retry_delay_ms = millis(delay),
                    "request failed, retrying (attempt {}/{})",
                    attempt,
                    max_attempts
                );
            }
            Event::FinalFailure {
                operation_name,
                attempt,
                max_attempts,
                error_type,
                error_message,
                retryable,
                status_code,
            } => {
                tracing::error!(
                    target: "rgql::events",
                    operation_name = %operation_name,
                    attempt,
                    max_attempts,
                    error_type = %error_type,
                    error_message = %error_message,
                    retryable,
                    status_code = ?status_code,
                    "request failed: {}",
                    operation_name
                );
            }
        }
    }
}

/// Copy of `headers` with sensitive values replaced by `***`.
/// Names are compared case-insensitively; the original casing is kept.
pub fn redact_headers(headers: &HashMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            let lower = k.to_ascii_lowercase();
            let value = if SENSITIVE_HEADERS.contains(&lower.as_str()) {
                REDACTED.to_string()
            } else {
                v.clone()
            };
            (k.clone(), value)
        })
        .collect()
}
