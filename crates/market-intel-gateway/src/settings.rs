//! Runtime settings for the gateway binary.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults ([`GatewaySettings::default`]);
//! 2. an optional file named by `MARKET_INTEL_CONFIG` (TOML, YAML, JSON,
//!    INI, RON or JSON5; `${VAR}` references are substituted);
//! 3. `MARKET_INTEL_*` environment variables, `__` separating nested keys.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MARKET_INTEL_HOST` | `0.0.0.0` |
//! | `MARKET_INTEL_PORT` | `3000` |
//! | `MARKET_INTEL_UPSTREAM_BASE_URL` | `http://localhost:8000` |
//! | `MARKET_INTEL_PROBE_PATH` | `/health` |
//! | `MARKET_INTEL_SESSION__ENABLED` | `true` |
//! | `MARKET_INTEL_ENDPOINTS__<ID>__CALL_TIMEOUT_MS` | per endpoint |

use market_intel_kernel::config::{self, ConfigResult, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Environment variable naming the optional settings file.
pub const CONFIG_PATH_ENV: &str = "MARKET_INTEL_CONFIG";

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "MARKET_INTEL";

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "http://localhost:8000";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
    /// Base URL of the analytics backend.
    pub upstream_base_url: String,
    /// Liveness path used by every probing endpoint.
    pub probe_path: String,
    pub session: SessionSettings,
    /// Per-endpoint overrides keyed by endpoint id (`chat`, `kpi_read`, …).
    pub endpoints: HashMap<String, EndpointOverride>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            probe_path: "/health".to_string(),
            session: SessionSettings::default(),
            endpoints: HashMap::new(),
        }
    }
}

impl GatewaySettings {
    /// Load from the file named by `MARKET_INTEL_CONFIG` (if set) and the
    /// process environment.
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty());
        Self::load_from(path.as_deref())
    }

    /// Load from an explicit settings file (if any) and the process
    /// environment.
    pub fn load_from(path: Option<&str>) -> ConfigResult<Self> {
        config::load_layered(path, ENV_PREFIX)
    }

    /// Parse settings from an in-memory TOML document.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        config::from_str(content, FileFormat::Toml)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Session gate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// When `false` every path is served without a session check.
    pub enabled: bool,
    pub cookie_name: String,
    pub login_path: String,
    /// Exact paths, or prefixes when ending in `/*`.
    pub public_paths: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cookie_name: "sb-access-token".to_string(),
            login_path: "/login".to_string(),
            public_paths: ["/", "/login", "/signup", "/auth/*", "/health"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Overrides applied on top of an endpoint's catalog defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointOverride {
    /// Force the liveness probe on or off.
    pub probe: Option<bool>,
    pub probe_timeout_ms: Option<u64>,
    pub call_timeout_ms: Option<u64>,
}
