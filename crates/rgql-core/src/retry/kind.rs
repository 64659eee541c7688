use serde::{Deserialize, Serialize};
use std::fmt;

/// High-level classification of a failed GraphQL call.
///
/// The set is closed: every kind carries its own retry disposition and
/// [`ErrorKind::is_retryable`] is the only place that disposition is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Connection refused, DNS failure, timeout, unreachable host.
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// Token missing, expired or rejected (401).
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    /// Caller is known but not allowed (403).
    #[serde(rename = "AUTHORIZATION_ERROR")]
    Authorization,
    /// Request arguments or document rejected (400).
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Server asked us to slow down (429).
    #[serde(rename = "RATE_LIMIT_ERROR")]
    RateLimit,
    /// Server-side failure (500, 502, 503, 504).
    #[serde(rename = "SERVER_ERROR")]
    ServerFault,
    /// Nothing matched.
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Network,
        ErrorKind::Authentication,
        ErrorKind::Authorization,
        ErrorKind::Validation,
        ErrorKind::RateLimit,
        ErrorKind::ServerFault,
        ErrorKind::Unknown,
    ];

    /// Whether a failure of this kind may succeed if the call is repeated.
    pub const fn is_retryable(self) -> bool {
        match self {
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::ServerFault => true,
            ErrorKind::Authentication
            | ErrorKind::Authorization
            | ErrorKind::Validation
            | ErrorKind::Unknown => false,
        }
    }

    /// Stable code used in logs and serialized errors.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Authentication => "AUTHENTICATION_ERROR",
            ErrorKind::Authorization => "AUTHORIZATION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::RateLimit => "RATE_LIMIT_ERROR",
            ErrorKind::ServerFault => "SERVER_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Default user-facing message for this kind.
    pub(crate) const fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Network => "network connection failed; check connectivity to the endpoint",
            ErrorKind::Authentication => "authentication failed; the token is missing, invalid or expired",
            ErrorKind::Authorization => "permission denied for the requested resource",
            ErrorKind::Validation => "request rejected; check the query and its variables",
            ErrorKind::RateLimit => "too many requests; slow down and retry later",
            ErrorKind::ServerFault => "server error; this may be temporary",
            ErrorKind::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
