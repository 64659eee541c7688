//! Request header set: defaults, caller overrides, bearer token.

use std::collections::HashMap;

pub const USER_AGENT: &str = concat!("rgql/", env!("CARGO_PKG_VERSION"));

fn defaults() -> [(&'static str, &'static str); 3] {
    [
        ("Content-Type", "application/json"),
        ("Accept", "application/json"),
        ("User-Agent", USER_AGENT),
    ]
}

/// Insert `name: value`, replacing any existing header with the same name
/// regardless of case.
fn set(headers: &mut HashMap<String, String>, name: &str, value: &str) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// Full header set for a request. Custom headers override defaults; a
/// non-empty token always wins for `Authorization`.
pub fn build_headers(custom: &HashMap<String, String>, token: Option<&str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for (name, value) in defaults() {
        set(&mut headers, name, value);
    }
    for (name, value) in custom {
        set(&mut headers, name, value);
    }
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        set(&mut headers, "Authorization", &format!("Bearer {}", token));
    }
    headers
}
