//! Resilient execution: error classification, backoff policy, and the retry loop.
//!
//! Failures are classified once (status code, then keywords, then GraphQL
//! extension code) into an [`ErrorKind`] whose retry disposition is fixed.
//! [`RetryController`] repeats an operation while the policy allows it and
//! races every backoff wait against the caller's [`CancelSignal`].

mod cancel;
mod classify;
mod error;
mod kind;
mod policy;
mod run;

pub use cancel::{CancelReason, CancelSignal};
pub use classify::{
    classify, classify_extension_code, classify_http_status, classify_kind, classify_message,
};
pub use error::{
    AttemptError, ClassifiedError, Extensions, RawFailure, RetryError, SourceError, Variables,
};
pub use kind::ErrorKind;
pub use policy::{
    RetryDecision, RetryPolicy, DEFAULT_EXPONENTIAL_BASE, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY,
};
pub use run::RetryController;
