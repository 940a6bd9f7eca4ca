//! HTTP transport seam.
//!
//! The retry engine talks to [`HttpTransport`] rather than to `reqwest`
//! directly, so tests can script responses and count calls.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use aihelper_core::{AiError, ProviderConfiguration, Result};

/// One outgoing POST, fully assembled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// What came back from the provider, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `retry-after` header, if any.
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }
}

/// Sends a request and reports either a response or a network-level failure.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `Err` means no HTTP response was received (connect error, timeout, reset).
    async fn post(&self, request: HttpRequest) -> std::result::Result<HttpResponse, String>;
}

// ─────────────────────────────────────────────
// reqwest implementation
// ─────────────────────────────────────────────

/// Production transport over a pooled `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the configured per-attempt timeout and proxy.
    pub fn new(config: &ProviderConfiguration) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout());
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.url())
                .map_err(|e| AiError::ClientSetup(format!("invalid proxy {}: {e}", proxy.url())))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AiError::ClientSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Convert header pairs, skipping any that are not valid HTTP.
pub fn to_header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid HTTP header"),
        }
    }
    map
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> std::result::Result<HttpResponse, String> {
        let response = self
            .client
            .post(&request.url)
            .headers(to_header_map(&request.headers))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request.body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| e.to_string())?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}
