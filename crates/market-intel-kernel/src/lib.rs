//! Forwarding-gateway kernel contract.
//!
//! This crate defines the *types and trait interfaces* shared by the Market
//! Intelligence gateway.  No network I/O happens here: the reqwest-backed
//! transport, `ForwardingGateway` itself and the axum server live in
//! `market-intel-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              market-intel-kernel  (this crate)              │
//! │  ForwardRequest / CallContext    UpstreamResult             │
//! │  GatewayResponse / FailureKind   EndpointConfig + validate  │
//! │  FallbackBuilder trait           UpstreamTransport trait    │
//! │  config loader                   GatewayError               │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              market-intel-gateway  (runtime crate)          │
//! │  ForwardingGateway::handle       HttpUpstream (reqwest)     │
//! │  EndpointCatalog + fallbacks     SessionGate                │
//! │  GatewayServer (axum)                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use market_intel_kernel::{
//!     EndpointConfig, GenericUnavailable, HttpMethod, ProbeConfig,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let endpoint = EndpointConfig::new(
//!     "analyze",
//!     HttpMethod::Post,
//!     "/analyze",
//!     Arc::new(GenericUnavailable),
//! )
//! .with_required_fields(["query_str", "market_domain_str"])
//! .with_probe(ProbeConfig::new("/health", Duration::from_secs(5)))
//! .with_call_timeout(Duration::from_secs(30));
//!
//! endpoint.validate().expect("endpoint config is valid");
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod fallback;
pub mod outcome;
pub mod transport;
pub mod types;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use endpoint::{DegradeMode, EndpointConfig, ProbeConfig, validate_base_url, validate_endpoints};
pub use error::GatewayError;
pub use fallback::{FallbackBuilder, GenericUnavailable, internal_fault_fallback, timestamp};
pub use outcome::{Degraded, FailureKind, GatewayResponse, UnreachableCause, UpstreamResult};
pub use transport::{TransportError, UpstreamCall, UpstreamReply, UpstreamTransport};
pub use types::{CallContext, ForwardRequest, HttpMethod, RequestError};
