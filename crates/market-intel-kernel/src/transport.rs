//! Upstream transport trait.
//!
//! A transport performs exactly one network operation per method call and
//! knows nothing about deadlines, fallbacks or classification.  The gateway
//! wraps every call in its own timeout and decides what a failure means.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::types::{ForwardRequest, HttpMethod};

/// Transport-level failure reported by an [`UpstreamTransport`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The upstream could not be reached (DNS, refused, reset, TLS, …).
    #[error("connection to backend failed: {0}")]
    Connect(String),

    /// The upstream answered but the body could not be read.
    #[error("failed to read backend response: {0}")]
    Body(String),

    /// The outbound request could not be constructed.  Nothing was sent.
    #[error("outbound request could not be built: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Faults on the gateway side, raised before any upstream contact.
    pub fn is_internal(&self) -> bool {
        matches!(self, TransportError::InvalidRequest(_))
    }
}

/// One forwarding call, borrowed from the inbound request.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamCall<'a> {
    pub endpoint_id: &'a str,
    pub method: HttpMethod,
    /// Path relative to the upstream base URL, e.g. `/analyze`.
    pub path: &'a str,
    pub request: &'a ForwardRequest,
    /// Propagated to the upstream as `x-request-id`.
    pub request_id: &'a str,
}

/// Raw answer from the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Bytes,
    /// `Content-Type` sent by the upstream, relayed with successful bodies.
    pub content_type: Option<String>,
}

impl UpstreamReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    /// Builder helper: record the upstream's content type.
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }
}

/// Kernel contract for talking to the analytics backend.
///
/// Implementations must be cancel-safe: the gateway drops the returned
/// future when a deadline elapses.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Human-readable target (base URL or mock name) for logs.
    fn target(&self) -> &str;

    /// Issue a liveness check against `path` and return the HTTP status.
    async fn probe(&self, path: &str) -> Result<u16, TransportError>;

    /// Forward one call and return the upstream's answer, whatever its status.
    async fn send(&self, call: UpstreamCall<'_>) -> Result<UpstreamReply, TransportError>;
}
