pub mod client;
pub mod config;
pub mod events;
pub mod logging;
pub mod retry;

pub use client::{Client, ClientConfig, ClientError};
pub use events::{Event, EventSink, NoopSink, TracingSink};
pub use retry::{
    classify, AttemptError, CancelReason, CancelSignal, ClassifiedError, ErrorKind, RawFailure,
    RetryController, RetryError, RetryPolicy,
};
