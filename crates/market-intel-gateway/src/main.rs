//! Market Intelligence gateway entry point.
//!
//! Loads the gateway settings (defaults, optional `MARKET_INTEL_CONFIG` file,
//! `MARKET_INTEL_*` environment) and starts the axum HTTP service.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | `market_intel_gateway=info` | Log filter. |
//! | `LOG_FORMAT` | *(text)* | `json` for structured JSON logs. |
//! | `MARKET_INTEL_CONFIG` | *(none)* | Path of a settings file. |
//! | `MARKET_INTEL_UPSTREAM_BASE_URL` | `http://localhost:8000` | Analytics backend. |
//! | `MARKET_INTEL_PORT` | `3000` | TCP port to listen on. |

use market_intel_gateway::server::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVE: &str = "market_intel_gateway=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let server = match GatewayServer::from_env() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Gateway error: {e}");
            std::process::exit(1);
        }
    };
    let settings = server.settings();

    info!(
        port = settings.port,
        upstream_base_url = %settings.upstream_base_url,
        overrides = settings.endpoints.len(),
        "Market Intelligence gateway configuration loaded"
    );

    if !settings.session.enabled {
        tracing::warn!("session gate is DISABLED - every API route is served without a session");
    }

    if let Err(e) = server.start().await {
        eprintln!("Gateway error: {e}");
        std::process::exit(1);
    }
}
