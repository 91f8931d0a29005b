//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires settings, the endpoint catalog, the upstream
//! transport and the session gate into a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`. |
//! | `POST` | `/api/analyze` | Market analysis. |
//! | `POST` | `/api/chat` | Analyst chat. |
//! | `GET`  | `/api/kpi` | KPI dashboard, fallback document on failure. |
//! | `POST` | `/api/kpi` | Record a KPI value. |
//! | `GET`  | `/api/agent/status` | Agent status. |
//! | `POST` | `/api/agent/sync` | Trigger an agent sync. |

use axum::{
    Router,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use market_intel_kernel::{FailureKind, GatewayResponse, internal_fault_fallback};
use std::any::Any;
use std::sync::Arc;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::backend::HttpUpstream;
use crate::catalog::EndpointCatalog;
use crate::error::ServerResult;
use crate::forward::ForwardingGateway;
use crate::handlers::{api_router, health};
use crate::response::ApiResponse;
use crate::session::{SessionGate, require_session};
use crate::settings::GatewaySettings;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level server owning the validated settings.
pub struct GatewayServer {
    settings: GatewaySettings,
}

impl GatewayServer {
    pub fn new(settings: GatewaySettings) -> Self {
        Self { settings }
    }

    /// Load settings from `MARKET_INTEL_CONFIG` and the environment.
    pub fn from_env() -> ServerResult<Self> {
        Ok(Self::new(GatewaySettings::load()?))
    }

    /// Load settings from an explicit file (if any) and the environment.
    pub fn from_file(path: Option<&str>) -> ServerResult<Self> {
        Ok(Self::new(GatewaySettings::load_from(path)?))
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Build the axum [`Router`] for the configured backend.
    ///
    /// Fails when the base URL or an endpoint override is invalid, so a bad
    /// configuration is caught before the listener is bound.
    pub fn build_app(&self) -> ServerResult<Router> {
        let upstream = HttpUpstream::new(self.settings.upstream_base_url.clone())?;
        let catalog = EndpointCatalog::from_settings(&self.settings)?;
        let gate = SessionGate::with_presence_check(self.settings.session.clone());

        Ok(build_router(
            ForwardingGateway::new(Arc::new(upstream)),
            catalog,
            Arc::new(gate),
        ))
    }

    /// Bind to `{host}:{port}` and serve until Ctrl+C or SIGTERM.
    pub async fn start(self) -> ServerResult<()> {
        let app = self.build_app()?;
        let addr = self.settings.bind_addr();

        info!(
            addr = %addr,
            upstream = %self.settings.upstream_base_url,
            session_gate = self.settings.session.enabled,
            "Market Intelligence gateway starting"
        );

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Market Intelligence gateway stopped");
        Ok(())
    }
}

/// Assemble the router around an already-built forwarder.
///
/// Exposed separately from [`GatewayServer::build_app`] so callers can plug
/// in any [`market_intel_kernel::UpstreamTransport`].
pub fn build_router(
    gateway: ForwardingGateway,
    catalog: EndpointCatalog,
    gate: Arc<SessionGate>,
) -> Router {
    let state = AppState::new(gateway, catalog);

    Router::new()
        .route("/health", get(health))
        .merge(api_router())
        .with_state(state)
        .layer(from_fn_with_state(gate, require_session))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// A panic anywhere below the router becomes the internal-fault envelope.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    let status = FailureKind::InternalFault.status_code();
    error!(
        status,
        cause = message,
        classification = %FailureKind::InternalFault,
        "request handler panicked"
    );

    let details = "unexpected gateway fault";
    ApiResponse(GatewayResponse::degraded(
        FailureKind::InternalFault,
        details,
        internal_fault_fallback(details, Utc::now()),
    ))
    .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
