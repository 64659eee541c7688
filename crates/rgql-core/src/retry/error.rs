//! Error values flowing through classification and the retry loop.

use super::cancel::CancelReason;
use super::kind::ErrorKind;
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// GraphQL variables attached to an operation. Diagnostic only.
pub type Variables = Map<String, Value>;

/// GraphQL error `extensions` object.
pub type Extensions = Map<String, Value>;

/// Shared handle to the failure that caused a classification.
pub type SourceError = Arc<dyn StdError + Send + Sync + 'static>;

/// Unclassified failure signal from a single attempt: error text plus
/// whatever the transport knew (status code, GraphQL extensions).
#[derive(Debug, Clone, Default)]
pub struct RawFailure {
    pub message: String,
    /// HTTP status; `None` or `Some(0)` means no transport status was available.
    pub status_code: Option<u16>,
    pub extensions: Option<Extensions>,
    pub source: Option<SourceError>,
}

impl RawFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Wrap an error, using its `Display` output as the failure text.
    pub fn from_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Arc::new(err)),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn with_extensions(mut self, extensions: Option<Extensions>) -> Self {
        self.extensions = extensions;
        self
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) if code != 0 => write!(f, "{} (status {})", self.message, code),
            _ => f.write_str(&self.message),
        }
    }
}

/// A failure after classification. Immutable once built; `retryable` is
/// always derived from the kind.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    source: Option<SourceError>,
    status_code: Option<u16>,
    extensions: Option<Extensions>,
    timestamp: DateTime<Utc>,
    operation_name: String,
    variables: Option<Variables>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            status_code: None,
            extensions: None,
            timestamp: Utc::now(),
            operation_name: String::new(),
            variables: None,
        }
    }

    pub fn network(message: impl Into<String>, source: Option<SourceError>) -> Self {
        Self::new(ErrorKind::Network, message).with_source(source)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn validation(message: impl Into<String>, variables: Option<Variables>) -> Self {
        Self::new(ErrorKind::Validation, message).with_variables(variables)
    }

    /// Rate-limit error carrying the server's suggested wait in its message.
    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::new(
            ErrorKind::RateLimit,
            format!("too many requests; retry after {:?}", retry_after),
        )
    }

    pub fn server(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::new(ErrorKind::ServerFault, message).with_status(status_code)
    }

    pub fn unknown(message: impl Into<String>, source: Option<SourceError>) -> Self {
        Self::new(ErrorKind::Unknown, message).with_source(source)
    }

    pub fn with_source(mut self, source: Option<SourceError>) -> Self {
        self.source = source;
        self
    }

    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code.filter(|c| *c != 0);
        self
    }

    pub fn with_extensions(mut self, extensions: Option<Extensions>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_operation(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = operation_name.into();
        self
    }

    pub fn with_variables(mut self, variables: Option<Variables>) -> Self {
        self.variables = variables;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.extensions.as_ref()
    }

    /// `extensions.code` when the server supplied it as a string.
    pub fn extension_code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn variables(&self) -> Option<&Variables> {
        self.variables.as_ref()
    }

    pub fn original(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Single-line JSON record for logs.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"failed to serialize error: {}"}}"#, e))
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl StdError for ClassifiedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl Serialize for ClassifiedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ClassifiedError", 9)?;
        s.serialize_field("error_type", &self.kind)?;
        s.serialize_field("message", &self.message)?;
        if let Some(source) = &self.source {
            s.serialize_field("original_error", &source.to_string())?;
        }
        if !self.operation_name.is_empty() {
            s.serialize_field("operation_name", &self.operation_name)?;
        }
        if let Some(variables) = &self.variables {
            s.serialize_field("variables", variables)?;
        }
        if let Some(code) = self.status_code {
            s.serialize_field("status_code", &code)?;
        }
        if let Some(extensions) = &self.extensions {
            s.serialize_field("extensions", extensions)?;
        }
        s.serialize_field("timestamp", &self.timestamp)?;
        s.serialize_field("retryable", &self.is_retryable())?;
        s.end()
    }
}

/// What a single attempt may fail with.
///
/// An already-classified error is passed through the retry loop untouched;
/// raw failures are classified by the controller.
#[derive(Debug, Clone)]
pub enum AttemptError {
    Raw(RawFailure),
    Classified(ClassifiedError),
}

impl AttemptError {
    pub fn raw(message: impl Into<String>) -> Self {
        AttemptError::Raw(RawFailure::new(message))
    }
}

impl From<RawFailure> for AttemptError {
    fn from(raw: RawFailure) -> Self {
        AttemptError::Raw(raw)
    }
}

impl From<ClassifiedError> for AttemptError {
    fn from(err: ClassifiedError) -> Self {
        AttemptError::Classified(err)
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Raw(raw) => write!(f, "{}", raw),
            AttemptError::Classified(err) => write!(f, "{}", err),
        }
    }
}

impl StdError for AttemptError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttemptError::Raw(raw) => raw
                .source
                .as_deref()
                .map(|e| e as &(dyn StdError + 'static)),
            AttemptError::Classified(err) => Some(err),
        }
    }
}

/// Terminal outcome of a retried call that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The caller's cancel signal fired; reported as-is.
    #[error("{0}")]
    Cancelled(CancelReason),
    /// The last attempt's classified failure.
    #[error(transparent)]
    Failed(ClassifiedError),
}

impl RetryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled(_))
    }

    /// The classified failure, unless the call was cancelled.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            RetryError::Failed(err) => Some(err),
            RetryError::Cancelled(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.classified().map(ClassifiedError::kind)
    }
}
