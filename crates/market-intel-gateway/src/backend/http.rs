//! reqwest-backed upstream transport.
//!
//! [`HttpUpstream`] talks JSON over HTTP to the analytics backend.  It never
//! interprets response bodies: success payloads are handed back as raw bytes
//! so the gateway can relay them unchanged.
//!
//! Redirects are never followed: a 3xx is the backend's answer and is
//! classified like any other non-success status.
//!
//! Deadlines are *not* configured on the client.  The forwarding gateway
//! wraps each future in `tokio::time::timeout`, so the per-endpoint probe and
//! call timeouts stay independent of each other.

use async_trait::async_trait;
use market_intel_kernel::{
    HttpMethod, TransportError, UpstreamCall, UpstreamReply, UpstreamTransport,
    validate_base_url,
};
use reqwest::{Client, header::CONTENT_TYPE, redirect};
use tracing::{debug, instrument};

use crate::error::ServerResult;

/// Header carrying the gateway's request id to the backend.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Forwards calls to `{base_url}{path}`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    base_url: String,
    client: Client,
}

impl HttpUpstream {
    /// Create a transport for `base_url`, e.g. `http://localhost:8000`.
    ///
    /// A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> ServerResult<Self> {
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        Self::with_client(base_url, client)
    }

    /// Create a transport reusing an existing client (and its pool).
    ///
    /// The client should be built with `redirect::Policy::none()`.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> ServerResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl UpstreamTransport for HttpUpstream {
    fn target(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn probe(&self, path: &str) -> Result<u16, TransportError> {
        let url = self.url(path);
        let request = self
            .client
            .get(&url)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(url = %url, status, "health probe answered");
        Ok(status)
    }

    #[instrument(
        skip(self, call),
        fields(endpoint = %call.endpoint_id, path = %call.path, request_id = %call.request_id)
    )]
    async fn send(&self, call: UpstreamCall<'_>) -> Result<UpstreamReply, TransportError> {
        let url = self.url(call.path);
        debug!(url = %url, method = call.method.as_str(), "forwarding to analytics backend");

        let builder = match call.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        }
        .header(REQUEST_ID_HEADER, call.request_id);

        // Writes carry the fields as a JSON object, reads as query parameters.
        let builder = if call.method.sends_body() {
            builder.json(call.request.fields())
        } else {
            builder.query(&call.request.to_query_pairs())
        };

        let request = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let start = std::time::Instant::now();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(status, latency_ms, bytes = body.len(), "backend answered");

        Ok(UpstreamReply::new(status, body).with_content_type(content_type))
    }
}
