//! `rgql classify` – show how a failure would be classified and whether it is retried.

use anyhow::Result;
use rgql_core::retry::{classify, Extensions, RawFailure};

pub fn run_classify(message: &str, status: Option<u16>, code: Option<&str>, json: bool) -> Result<()> {
    let mut raw = RawFailure::new(message);
    if let Some(status) = status {
        raw = raw.with_status(status);
    }
    if let Some(code) = code {
        let mut extensions = Extensions::new();
        extensions.insert("code".to_string(), serde_json::Value::from(code));
        raw = raw.with_extensions(Some(extensions));
    }

    let err = classify(raw, "", None);
    if json {
        println!("{}", err.to_json());
    } else {
        println!("kind:      {:?}", err.kind());
        println!("code:      {}", err.kind());
        println!("retryable: {}", err.is_retryable());
        println!("message:   {}", err.message());
    }
    Ok(())
}
