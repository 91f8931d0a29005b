//! The gateway's endpoint catalog.
//!
//! | Id | Inbound | Upstream | Required | Probe | Call timeout | Degrade |
//! |----|---------|----------|----------|-------|--------------|---------|
//! | `analyze` | `POST /api/analyze` | `POST /analyze` | `query_str`, `market_domain_str` | 5 s | 30 s | envelope |
//! | `chat` | `POST /api/chat` | `POST /chat` | `message`, `session_id` | 5 s | 30 s | envelope |
//! | `kpi_read` | `GET /api/kpi` | `GET /kpi` | | | 10 s | annotated |
//! | `kpi_write` | `POST /api/kpi` | `POST /kpi` | `metric`, `value` | | 10 s | envelope |
//! | `agent_status` | `GET /api/agent/status` | `GET /agent/status` | | | 5 s | envelope |
//! | `agent_sync` | `POST /api/agent/sync` | `POST /agent/sync` | `action` | 5 s | 60 s | envelope |

use market_intel_kernel::{
    DegradeMode, EndpointConfig, GatewayError, HttpMethod, ProbeConfig, validate_endpoints,
};
use std::sync::Arc;
use std::time::Duration;

use crate::fallback::{
    AgentStatusFallback, AgentSyncFallback, AnalyzeFallback, ChatFallback, KpiReadFallback,
    KpiWriteFallback,
};
use crate::settings::{EndpointOverride, GatewaySettings};

/// Probe timeout used when an override turns the probe on for an endpoint
/// that has none by default.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Every endpoint the gateway serves, validated.
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    pub analyze: EndpointConfig,
    pub chat: EndpointConfig,
    pub kpi_read: EndpointConfig,
    pub kpi_write: EndpointConfig,
    pub agent_status: EndpointConfig,
    pub agent_sync: EndpointConfig,
}

impl EndpointCatalog {
    /// The built-in catalog probing `probe_path` on the backend.
    pub fn new(probe_path: &str) -> Self {
        let probe = |secs| ProbeConfig::new(probe_path, Duration::from_secs(secs));

        Self {
            analyze: EndpointConfig::new(
                "analyze",
                HttpMethod::Post,
                "/analyze",
                Arc::new(AnalyzeFallback),
            )
            .with_required_fields(["query_str", "market_domain_str"])
            .with_probe(probe(5))
            .with_call_timeout(Duration::from_secs(30)),

            chat: EndpointConfig::new("chat", HttpMethod::Post, "/chat", Arc::new(ChatFallback))
                .with_required_fields(["message", "session_id"])
                .with_probe(probe(5))
                .with_call_timeout(Duration::from_secs(30)),

            kpi_read: EndpointConfig::new(
                "kpi_read",
                HttpMethod::Get,
                "/kpi",
                Arc::new(KpiReadFallback),
            )
            .with_call_timeout(Duration::from_secs(10))
            .with_degrade_mode(DegradeMode::Annotated),

            kpi_write: EndpointConfig::new(
                "kpi_write",
                HttpMethod::Post,
                "/kpi",
                Arc::new(KpiWriteFallback),
            )
            .with_required_fields(["metric", "value"])
            .with_call_timeout(Duration::from_secs(10)),

            agent_status: EndpointConfig::new(
                "agent_status",
                HttpMethod::Get,
                "/agent/status",
                Arc::new(AgentStatusFallback),
            )
            .with_call_timeout(Duration::from_secs(5)),

            agent_sync: EndpointConfig::new(
                "agent_sync",
                HttpMethod::Post,
                "/agent/sync",
                Arc::new(AgentSyncFallback),
            )
            .with_required_fields(["action"])
            .with_probe(probe(5))
            .with_call_timeout(Duration::from_secs(60)),
        }
    }

    /// Build the catalog and apply the per-endpoint overrides from settings.
    ///
    /// An override naming an unknown endpoint id is an error, as is any
    /// override producing an invalid endpoint (e.g. a zero timeout).
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let mut catalog = Self::new(&settings.probe_path);

        for (id, overrides) in &settings.endpoints {
            let endpoint = catalog
                .get_mut(id)
                .ok_or_else(|| GatewayError::UnknownEndpoint(id.clone()))?;
            apply_override(endpoint, overrides, &settings.probe_path);
        }

        catalog.validate()?;
        Ok(catalog)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointConfig> {
        [
            &self.analyze,
            &self.chat,
            &self.kpi_read,
            &self.kpi_write,
            &self.agent_status,
            &self.agent_sync,
        ]
        .into_iter()
    }

    pub fn get(&self, id: &str) -> Option<&EndpointConfig> {
        self.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut EndpointConfig> {
        match id {
            "analyze" => Some(&mut self.analyze),
            "chat" => Some(&mut self.chat),
            "kpi_read" => Some(&mut self.kpi_read),
            "kpi_write" => Some(&mut self.kpi_write),
            "agent_status" => Some(&mut self.agent_status),
            "agent_sync" => Some(&mut self.agent_sync),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_endpoints(self.iter())
    }
}

fn apply_override(endpoint: &mut EndpointConfig, overrides: &EndpointOverride, probe_path: &str) {
    if let Some(ms) = overrides.call_timeout_ms {
        endpoint.call_timeout = Duration::from_millis(ms);
    }

    match overrides.probe {
        Some(false) => endpoint.probe = None,
        Some(true) if endpoint.probe.is_none() => {
            endpoint.probe = Some(ProbeConfig::new(probe_path, DEFAULT_PROBE_TIMEOUT));
        }
        _ => {}
    }

    if let (Some(ms), Some(probe)) = (overrides.probe_timeout_ms, endpoint.probe.as_mut()) {
        probe.timeout = Duration::from_millis(ms);
    }
}
