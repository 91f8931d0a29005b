//! `market-intel-gateway`: the Market Intelligence gateway runtime.
//!
//! This crate provides the concrete implementations of the contracts defined
//! in `market-intel-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`UpstreamTransport`](market_intel_kernel::UpstreamTransport) | [`backend::HttpUpstream`] |
//! | [`FallbackBuilder`](market_intel_kernel::FallbackBuilder) | [`fallback::AnalyzeFallback`], [`fallback::KpiReadFallback`], … |
//! | [`EndpointConfig`](market_intel_kernel::EndpointConfig) | [`catalog::EndpointCatalog`] |
//!
//! [`forward::ForwardingGateway`] runs validation, probe, forward and
//! fallback for every call; [`server::GatewayServer`] exposes it over axum
//! behind the [`session`] gate.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use market_intel_gateway::server::GatewayServer;
//! use market_intel_gateway::settings::GatewaySettings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = GatewaySettings {
//!         upstream_base_url: "http://localhost:8000".to_string(),
//!         ..Default::default()
//!     };
//!
//!     GatewayServer::new(settings).start().await.unwrap();
//! }
//! ```

pub mod backend;
pub mod catalog;
pub mod error;
pub mod fallback;
pub mod forward;
pub mod handlers;
pub mod response;
pub mod server;
pub mod session;
pub mod settings;
pub mod state;

pub use forward::ForwardingGateway;

// Re-export the kernel for convenience.
pub use market_intel_kernel as kernel;
