//! Per-endpoint forwarding configuration and definition-time validation.
//!
//! An [`EndpointConfig`] tells the gateway everything it needs for one
//! inbound route: where to forward, which fields are mandatory, whether to
//! probe first, how long to wait, how to degrade and how to build the
//! fallback payload.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::GatewayError;
use crate::fallback::FallbackBuilder;
use crate::types::HttpMethod;

/// Default forwarding deadline.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// Degrade mode / probe
// ─────────────────────────────────────────────────────────────────────────────

/// How a post-validation failure is rendered for this endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeMode {
    /// `{ error, details, fallback_data }` with 502 / 503.
    #[default]
    Envelope,
    /// Fallback document with `metadata.source = "fallback_data"`, status 200.
    /// Used by dashboard reads that tolerate partial failure.
    Annotated,
}

/// Liveness check issued before the forwarding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Path relative to the upstream base URL, usually `/health`.
    pub path: String,
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EndpointConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Forwarding rules for a single endpoint.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Unique stable identifier, used in logs (`analyze`, `kpi_read`, …).
    pub id: String,
    /// Method used for the upstream call.
    pub method: HttpMethod,
    /// Upstream path.  Must begin with `/`.
    pub upstream_path: String,
    /// Fields that must be present and non-empty.
    pub required_fields: Vec<String>,
    /// `None` skips the liveness probe.
    pub probe: Option<ProbeConfig>,
    /// Deadline for the forwarding call, independent of the probe timeout.
    pub call_timeout: Duration,
    pub degrade_mode: DegradeMode,
    pub fallback: Arc<dyn FallbackBuilder>,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("upstream_path", &self.upstream_path)
            .field("required_fields", &self.required_fields)
            .field("probe", &self.probe)
            .field("call_timeout", &self.call_timeout)
            .field("degrade_mode", &self.degrade_mode)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl EndpointConfig {
    /// Create an endpoint with no required fields, no probe, the default
    /// call timeout and envelope degradation.
    pub fn new(
        id: impl Into<String>,
        method: HttpMethod,
        upstream_path: impl Into<String>,
        fallback: Arc<dyn FallbackBuilder>,
    ) -> Self {
        Self {
            id: id.into(),
            method,
            upstream_path: upstream_path.into(),
            required_fields: Vec::new(),
            probe: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            degrade_mode: DegradeMode::Envelope,
            fallback,
        }
    }

    /// Builder: set the required field names.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: probe the upstream before forwarding.
    pub fn with_probe(mut self, probe: ProbeConfig) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Builder: skip the probe.
    pub fn without_probe(mut self) -> Self {
        self.probe = None;
        self
    }

    /// Builder: set the forwarding deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Builder: set the degrade mode.
    pub fn with_degrade_mode(mut self, mode: DegradeMode) -> Self {
        self.degrade_mode = mode;
        self
    }

    /// Structural checks run before the endpoint is served.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.id.trim().is_empty() {
            return Err(GatewayError::EmptyEndpointId);
        }
        validate_path(&self.id, &self.upstream_path)?;
        if self.required_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(GatewayError::EmptyRequiredField(self.id.clone()));
        }
        if self.call_timeout.is_zero() {
            return Err(GatewayError::ZeroTimeout(self.id.clone(), "call"));
        }
        if let Some(probe) = &self.probe {
            validate_path(&self.id, &probe.path)?;
            if probe.timeout.is_zero() {
                return Err(GatewayError::ZeroTimeout(self.id.clone(), "probe"));
            }
        }
        Ok(())
    }
}

fn validate_path(endpoint_id: &str, path: &str) -> Result<(), GatewayError> {
    if path.trim().is_empty() {
        return Err(GatewayError::InvalidPath(
            endpoint_id.to_string(),
            "path cannot be empty".to_string(),
        ));
    }
    if !path.starts_with('/') {
        return Err(GatewayError::InvalidPath(
            endpoint_id.to_string(),
            format!("path '{path}' must start with '/'"),
        ));
    }
    Ok(())
}

/// Validate every endpoint and reject duplicate ids.
pub fn validate_endpoints<'a, I>(endpoints: I) -> Result<(), GatewayError>
where
    I: IntoIterator<Item = &'a EndpointConfig>,
{
    let mut seen = HashSet::new();
    for endpoint in endpoints {
        endpoint.validate()?;
        if !seen.insert(endpoint.id.as_str()) {
            return Err(GatewayError::DuplicateEndpoint(endpoint.id.clone()));
        }
    }
    Ok(())
}

/// The upstream base URL must be an absolute http(s) URL.
pub fn validate_base_url(url: &str) -> Result<(), GatewayError> {
    if url.trim().is_empty() {
        return Err(GatewayError::InvalidBaseUrl(
            url.to_string(),
            "base URL cannot be empty".to_string(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(GatewayError::InvalidBaseUrl(
            url.to_string(),
            "base URL must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}
