//! HTTP transport seam and its libcurl implementation.
//!
//! A transport sends one POST and hands back the status and body, or a
//! typed failure. It knows nothing about GraphQL or retries.

use crate::retry::CancelSignal;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Upper bound on the connect phase; the overall timeout still applies.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure before any HTTP status was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("transport task failed: {0}")]
    Task(String),
}

impl TransportError {
    /// True for connect/resolve/timeout/send/receive failures, i.e. the
    /// request never produced a response.
    pub fn is_network_failure(&self) -> bool {
        match self {
            TransportError::Curl(e) => {
                e.is_operation_timedout()
                    || e.is_couldnt_connect()
                    || e.is_couldnt_resolve_host()
                    || e.is_couldnt_resolve_proxy()
                    || e.is_read_error()
                    || e.is_recv_error()
                    || e.is_send_error()
                    || e.is_got_nothing()
            }
            TransportError::Task(_) => false,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Implementations should abandon the transfer when
    /// `cancel` fires.
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancelSignal,
    ) -> Result<HttpResponse, TransportError>;
}

/// libcurl transport. Each request runs on the blocking pool with a fresh
/// easy handle; no connection reuse between requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

#[async_trait]
impl Transport for CurlTransport {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancelSignal,
    ) -> Result<HttpResponse, TransportError> {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || post(&request, &cancel))
            .await
            .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

/// Blocking POST. The progress callback aborts the transfer once `cancel` fires.
fn post(request: &HttpRequest, cancel: &CancelSignal) -> Result<HttpResponse, TransportError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url)?;
    easy.post(true)?;
    easy.post_fields_copy(&request.body)?;
    easy.connect_timeout(CONNECT_TIMEOUT.min(request.timeout))?;
    easy.timeout(request.timeout)?;
    easy.progress(true)?;

    let mut list = curl::easy::List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(HttpResponse {
        status: u16::try_from(status).unwrap_or(0),
        body,
    })
}
