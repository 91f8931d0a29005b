//! Gateway runtime error types

use market_intel_kernel::GatewayError;
use market_intel_kernel::config::ConfigError;
use thiserror::Error;

/// Errors raised while assembling or starting the server.
///
/// Per-request failures never surface here: they are classified into a
/// [`market_intel_kernel::GatewayResponse`] by the forwarding gateway.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("invalid gateway configuration: {0}")]
    Config(#[from] GatewayError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
