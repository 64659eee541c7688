//! GraphQL client: builds requests, sends them through a [`Transport`], turns
//! failures into [`ClassifiedError`]s, and runs every call under the retry
//! controller.

mod headers;
mod transport;
mod wire;

pub use headers::{build_headers, USER_AGENT};
pub use transport::{CurlTransport, HttpRequest, HttpResponse, Transport, TransportError};
pub use wire::{GraphQlError, GraphQlLocation, GraphQlRequest, GraphQlResponse};

use crate::events::{redact_headers, Event, EventSink, NoopSink, TracingSink};
use crate::retry::{
    classify, AttemptError, CancelSignal, ClassifiedError, RawFailure, RetryController,
    RetryError, RetryPolicy, SourceError, Variables,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint (http or https).
    pub endpoint: String,
    /// Bearer token sent as `Authorization`.
    pub token: Option<String>,
    /// Extra request headers; override the defaults.
    pub headers: HashMap<String, String>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// When false, events go nowhere instead of to `tracing`.
    pub logging: bool,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            logging: true,
        }
    }

    /// Check the endpoint and normalize the rest.
    pub fn validate(&mut self) -> Result<(), ClientError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ClientError::EmptyEndpoint);
        }
        let parsed = url::Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }
        self.endpoint = endpoint.to_string();
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        self.retry = self.retry.normalized();
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("endpoint must not be empty")]
    EmptyEndpoint,
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Non-2xx reply, kept as the source of the classified error.
#[derive(Debug, thiserror::Error)]
#[error("HTTP {status}: {body}")]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

/// GraphQL client. Calls take `&self`, so one client can be shared across
/// tasks; each call has its own retry budget.
pub struct Client {
    config: ClientConfig,
    headers: HashMap<String, String>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
    retry: RetryController,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint)
            .field("headers", &redact_headers(&self.headers))
            .field("retry", self.retry.policy())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client over libcurl, logging through `tracing` when `config.logging` is set.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let sink: Arc<dyn EventSink> = if config.logging {
            Arc::new(TracingSink)
        } else {
            Arc::new(NoopSink)
        };
        Self::with_transport(config, Arc::new(CurlTransport), sink)
    }

    pub fn with_transport(
        mut config: ClientConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let headers = build_headers(&config.headers, config.token.as_deref());
        let retry = RetryController::new(config.retry, Arc::clone(&sink));
        Ok(Self {
            config,
            headers,
            transport,
            sink,
            retry,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Headers sent with every request (unredacted).
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.config.token = token;
        self.rebuild_headers();
    }

    /// Merge `headers` into the custom header set.
    pub fn update_headers(&mut self, headers: HashMap<String, String>) {
        self.config.headers.extend(headers);
        self.rebuild_headers();
    }

    fn rebuild_headers(&mut self) {
        self.headers = build_headers(&self.config.headers, self.config.token.as_deref());
    }

    /// Run a query and return its `data` (JSON `null` when absent).
    pub async fn query(
        &self,
        cancel: &CancelSignal,
        query: &str,
        variables: Option<Variables>,
        operation_name: Option<&str>,
    ) -> Result<Value, RetryError> {
        self.execute(cancel, query, variables.as_ref(), operation_name.unwrap_or("Query"))
            .await
    }

    /// Run a mutation and return its `data`.
    pub async fn mutate(
        &self,
        cancel: &CancelSignal,
        mutation: &str,
        variables: Option<Variables>,
        operation_name: Option<&str>,
    ) -> Result<Value, RetryError> {
        self.execute(
            cancel,
            mutation,
            variables.as_ref(),
            operation_name.unwrap_or("Mutation"),
        )
        .await
    }

    /// [`query`](Self::query), decoding `data` into `T`.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        cancel: &CancelSignal,
        query: &str,
        variables: Option<Variables>,
        operation_name: Option<&str>,
    ) -> Result<T, RetryError> {
        let name = operation_name.unwrap_or("Query");
        let data = self.execute(cancel, query, variables.as_ref(), name).await?;
        decode(data, name, variables.as_ref())
    }

    /// [`mutate`](Self::mutate), decoding `data` into `T`.
    pub async fn mutate_as<T: DeserializeOwned>(
        &self,
        cancel: &CancelSignal,
        mutation: &str,
        variables: Option<Variables>,
        operation_name: Option<&str>,
    ) -> Result<T, RetryError> {
        let name = operation_name.unwrap_or("Mutation");
        let data = self.execute(cancel, mutation, variables.as_ref(), name).await?;
        decode(data, name, variables.as_ref())
    }

    async fn execute(
        &self,
        cancel: &CancelSignal,
        document: &str,
        variables: Option<&Variables>,
        operation_name: &str,
    ) -> Result<Value, RetryError> {
        self.retry
            .execute_with_retry(
                cancel,
                move |signal| self.attempt(signal, document, variables, operation_name),
                operation_name,
            )
            .await
    }

    /// One HTTP round trip. Every failure comes back already classified so
    /// it carries the variables.
    async fn attempt(
        &self,
        cancel: CancelSignal,
        document: &str,
        variables: Option<&Variables>,
        operation_name: &str,
    ) -> Result<Value, AttemptError> {
        let fail = |raw: RawFailure| -> AttemptError {
            classify(raw, operation_name, variables).into()
        };

        let body = serde_json::to_vec(&GraphQlRequest {
            query: document,
            variables,
        })
        .map_err(|e| fail(RawFailure::from_error(e)))?;

        self.sink.record(&Event::RequestStarted {
            operation_name: operation_name.to_string(),
            variables: variables.cloned(),
            headers: redact_headers(&self.headers),
        });

        let request = HttpRequest {
            url: self.config.endpoint.clone(),
            headers: self.headers.clone(),
            body,
            timeout: self.config.timeout,
        };
        let started = Instant::now();
        let response = match self.transport.send(request, &cancel).await {
            Ok(response) => response,
            Err(e) if e.is_network_failure() => {
                let message = format!("network failure: {}", e);
                let source: SourceError = Arc::new(e);
                return Err(ClassifiedError::network(message, Some(source))
                    .with_operation(operation_name)
                    .with_variables(variables.cloned())
                    .into());
            }
            Err(e) => return Err(fail(RawFailure::from_error(e))),
        };
        let elapsed = started.elapsed();

        if !response.is_success() {
            self.record_response(operation_name, elapsed, response.status, true);
            let extensions = GraphQlResponse::parse_lenient(&response.body)
                .first_error()
                .and_then(|e| e.extensions.clone());
            let raw = RawFailure::from_error(HttpStatusError {
                status: response.status,
                body: response.body_text(),
            })
            .with_status(response.status)
            .with_extensions(extensions);
            return Err(fail(raw));
        }

        let parsed: GraphQlResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.record_response(operation_name, elapsed, response.status, true);
                return Err(fail(RawFailure::from_error(e)));
            }
        };

        if let Some(first) = parsed.errors.into_iter().next() {
            self.record_response(operation_name, elapsed, response.status, true);
            // GraphQL-level failure on a 2xx: classify from the message and
            // extensions, not from the transport status.
            let extensions = first.extensions.clone();
            let raw = RawFailure::from_error(first).with_extensions(extensions);
            return Err(fail(raw));
        }

        self.record_response(operation_name, elapsed, response.status, false);
        Ok(parsed.data.unwrap_or(Value::Null))
    }

    fn record_response(&self, operation_name: &str, duration: Duration, status: u16, has_error: bool) {
        self.sink.record(&Event::ResponseReceived {
            operation_name: operation_name.to_string(),
            duration,
            status_code: Some(status).filter(|s| *s != 0),
            has_error,
        });
    }
}

fn decode<T: DeserializeOwned>(
    data: Value,
    operation_name: &str,
    variables: Option<&Variables>,
) -> Result<T, RetryError> {
    serde_json::from_value(data)
        .map_err(|e| RetryError::Failed(classify(RawFailure::from_error(e), operation_name, variables)))
}
