//! Configuration error types for `market-intel-kernel`.
//!
//! [`GatewayError`] covers every failure mode that can be detected at
//! *definition time*, before any network I/O occurs: empty ids, malformed
//! paths, zero timeouts and duplicate endpoints.  Runtime failures (connection
//! refused, upstream timeout, …) never surface as errors: the gateway turns
//! them into a [`GatewayResponse`](crate::GatewayResponse).

use thiserror::Error;

/// Definition-time error type for the forwarding contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Endpoints ───────────────────────────────────────────────────────────
    /// An endpoint `id` field is empty or whitespace-only.
    #[error("endpoint id cannot be empty")]
    EmptyEndpointId,

    /// Two endpoints share the same id.
    #[error("endpoint '{0}' is already registered")]
    DuplicateEndpoint(String),

    /// A settings override names an endpoint that does not exist.
    #[error("no endpoint named '{0}'")]
    UnknownEndpoint(String),

    /// An upstream or probe path is syntactically invalid.
    #[error("endpoint '{0}' has an invalid path: {1}")]
    InvalidPath(String, String),

    /// A required field name is empty.
    #[error("endpoint '{0}' declares an empty required field name")]
    EmptyRequiredField(String),

    // ── Timeouts ────────────────────────────────────────────────────────────
    /// A probe or call timeout is zero, which would fail every request.
    #[error("endpoint '{0}' has a zero {1} timeout")]
    ZeroTimeout(String, &'static str),

    // ── Upstream ────────────────────────────────────────────────────────────
    /// The upstream base URL is not an absolute http(s) URL.
    #[error("invalid upstream base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),
}
