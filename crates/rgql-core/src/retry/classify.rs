//! Classify raw failures (status code, error text, GraphQL extensions) into error kinds.
//!
//! Priority is fixed: a nonzero status code decides alone; otherwise keyword
//! groups are tried in order and the first hit wins; then `extensions.code`;
//! then `Unknown`.

use super::error::{ClassifiedError, Extensions, RawFailure, Variables};
use super::kind::ErrorKind;
use serde_json::Value;

/// Keyword groups in evaluation order. Matching is substring, not whole-word.
const KEYWORD_GROUPS: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::Network,
        &["network", "connection", "timeout", "refused", "unreachable", "dns"],
    ),
    (
        ErrorKind::Authentication,
        &["unauthorized", "token", "authentication", "login", "credential"],
    ),
    (
        ErrorKind::Authorization,
        &["forbidden", "permission", "access denied", "not allowed"],
    ),
    (
        ErrorKind::Validation,
        &["validation", "invalid", "required", "missing", "format", "schema"],
    ),
    (
        ErrorKind::RateLimit,
        &["rate limit", "too many requests", "quota exceeded", "throttle"],
    ),
    (
        ErrorKind::ServerFault,
        &["internal server", "service unavailable", "server error", "500", "502", "503"],
    ),
];

/// Classify an HTTP status code. Any nonzero code outside the table is `Unknown`.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        400 => ErrorKind::Validation,
        429 => ErrorKind::RateLimit,
        500 | 502 | 503 | 504 => ErrorKind::ServerFault,
        _ => ErrorKind::Unknown,
    }
}

/// First keyword group with a substring hit in the lower-cased message.
pub fn classify_message(message: &str) -> Option<ErrorKind> {
    let lower = message.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
}

/// Refinement from a server-supplied `extensions.code` string.
pub fn classify_extension_code(code: &str) -> Option<ErrorKind> {
    let lower = code.to_lowercase();
    if lower.contains("auth") {
        Some(ErrorKind::Authentication)
    } else if lower.contains("forbidden") {
        Some(ErrorKind::Authorization)
    } else if lower.contains("validation") {
        Some(ErrorKind::Validation)
    } else {
        None
    }
}

fn extension_code(extensions: Option<&Extensions>) -> Option<&str> {
    extensions?.get("code").and_then(Value::as_str)
}

/// Kind for a raw failure, following the fixed priority order.
pub fn classify_kind(failure: &RawFailure) -> ErrorKind {
    if let Some(code) = failure.status_code.filter(|c| *c != 0) {
        return classify_http_status(code);
    }
    classify_message(&failure.message)
        .or_else(|| extension_code(failure.extensions.as_ref()).and_then(classify_extension_code))
        .unwrap_or(ErrorKind::Unknown)
}

/// Classify a raw failure into an enriched, immutable [`ClassifiedError`].
pub fn classify(
    failure: RawFailure,
    operation_name: &str,
    variables: Option<&Variables>,
) -> ClassifiedError {
    let kind = classify_kind(&failure);
    let message = match (kind, failure.status_code.filter(|c| *c != 0)) {
        (ErrorKind::Unknown, Some(code)) => format!("unknown error (status {})", code),
        (ErrorKind::Unknown, None) => format!("unknown error: {}", failure.message),
        (kind, _) => kind.default_message().to_string(),
    };
    ClassifiedError::new(kind, message)
        .with_status(failure.status_code)
        .with_extensions(failure.extensions)
        .with_source(failure.source)
        .with_operation(operation_name)
        .with_variables(variables.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(code: &str) -> Extensions {
        let mut m = Extensions::new();
        m.insert("code".into(), Value::from(code));
        m
    }

    #[test]
    fn status_table() {
        let cases = [
            (401, ErrorKind::Authentication),
            (403, ErrorKind::Authorization),
            (400, ErrorKind::Validation),
            (429, ErrorKind::RateLimit),
            (500, ErrorKind::ServerFault),
            (502, ErrorKind::ServerFault),
            (503, ErrorKind::ServerFault),
            (504, ErrorKind::ServerFault),
        ];
        for (code, expected) in cases {
            // Message text must not influence a status-code classification.
            let raw = RawFailure::new("connection refused; invalid token").with_status(code);
            let err = classify(raw, "Op", None);
            assert_eq!(err.kind(), expected, "status {}", code);
            assert_eq!(err.is_retryable(), expected.is_retryable());
            assert_eq!(err.status_code(), Some(code));
        }
    }

    #[test]
    fn other_status_is_unknown_even_with_keywords() {
        let raw = RawFailure::new("network unreachable").with_status(404);
        assert_eq!(classify_kind(&raw), ErrorKind::Unknown);
        let raw = RawFailure::new("rate limit").with_status(200);
        assert_eq!(classify_kind(&raw), ErrorKind::Unknown);
    }

    #[test]
    fn zero_status_uses_keywords() {
        let raw = RawFailure::new("dial tcp: Connection Refused").with_status(0);
        let err = classify(raw, "Op", None);
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn keyword_groups() {
        let cases = [
            ("i/o timeout", ErrorKind::Network),
            ("DNS lookup failed", ErrorKind::Network),
            ("Unauthorized", ErrorKind::Authentication),
            ("bad credentials", ErrorKind::Authentication),
            ("Forbidden", ErrorKind::Authorization),
            ("Access Denied for user", ErrorKind::Authorization),
            ("field is required", ErrorKind::Validation),
            ("Schema mismatch", ErrorKind::Validation),
            ("Rate limit hit", ErrorKind::RateLimit),
            ("request throttled", ErrorKind::RateLimit),
            ("Internal Server fault", ErrorKind::ServerFault),
            ("upstream returned 502", ErrorKind::ServerFault),
        ];
        for (msg, expected) in cases {
            assert_eq!(classify_message(msg), Some(expected), "{}", msg);
        }
        assert_eq!(classify_message("something odd"), None);
    }

    #[test]
    fn first_group_wins() {
        // "token" (auth) and "timeout" (network): network is evaluated first.
        assert_eq!(
            classify_message("token refresh timeout"),
            Some(ErrorKind::Network)
        );
        // "invalid" (validation) before "quota exceeded" (rate limit).
        assert_eq!(
            classify_message("invalid request: quota exceeded"),
            Some(ErrorKind::Validation)
        );
        // Substring, not whole-word: "informat" contains "format".
        assert_eq!(classify_message("misinformation"), Some(ErrorKind::Validation));
    }

    #[test]
    fn numbers_in_text_are_keywords_not_statuses() {
        let raw = RawFailure::new("got 503 from upstream");
        let err = classify(raw, "Op", None);
        assert_eq!(err.kind(), ErrorKind::ServerFault);
        assert_eq!(err.status_code(), None);

        let raw = RawFailure::new("HTTP 401 from upstream");
        assert_eq!(classify_kind(&raw), ErrorKind::Unknown);
    }

    #[test]
    fn extension_code_refines_unmatched_text() {
        let raw = RawFailure::new("nope").with_extensions(Some(ext("UNAUTHENTICATED")));
        assert_eq!(classify_kind(&raw), ErrorKind::Authentication);
        let raw = RawFailure::new("nope").with_extensions(Some(ext("FORBIDDEN")));
        assert_eq!(classify_kind(&raw), ErrorKind::Authorization);
        let raw = RawFailure::new("nope").with_extensions(Some(ext("GRAPHQL_VALIDATION_FAILED")));
        assert_eq!(classify_kind(&raw), ErrorKind::Validation);
        let raw = RawFailure::new("nope").with_extensions(Some(ext("INTERNAL")));
        assert_eq!(classify_kind(&raw), ErrorKind::Unknown);
    }

    #[test]
    fn keywords_beat_extension_code() {
        let raw = RawFailure::new("connection reset").with_extensions(Some(ext("FORBIDDEN")));
        assert_eq!(classify_kind(&raw), ErrorKind::Network);
    }

    #[test]
    fn extensions_ignored_when_status_present() {
        let raw = RawFailure::new("nope")
            .with_status(418)
            .with_extensions(Some(ext("FORBIDDEN")));
        assert_eq!(classify_kind(&raw), ErrorKind::Unknown);
    }

    #[test]
    fn context_is_attached() {
        let mut vars = Variables::new();
        vars.insert("id".into(), Value::from(7));
        let err = classify(RawFailure::new("weird"), "GetUser", Some(&vars));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.is_retryable());
        assert_eq!(err.operation_name(), "GetUser");
        assert_eq!(err.variables().unwrap()["id"], 7);
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "network is down");
        let err = classify(RawFailure::from_error(io), "Op", None);
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.original().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }
}
