//! The forwarding gateway.
//!
//! [`ForwardingGateway::handle`] is the single place where an inbound call
//! meets the analytics backend:
//!
//! ```text
//!  ForwardRequest ─► validate ─► probe? ─► send (deadline) ─► classify
//!                       │           │              │              │
//!                       ▼           ▼              ▼              ▼
//!                      400         503         502 / 503     pass-through
//!                                     └──── fallback builder ────┘
//! ```
//!
//! Every path returns a [`GatewayResponse`]; nothing is propagated to the
//! caller as a raw error.

use chrono::Utc;
use market_intel_kernel::{
    CallContext, DegradeMode, EndpointConfig, FailureKind, ForwardRequest, GatewayResponse,
    ProbeConfig, TransportError, UnreachableCause, UpstreamCall, UpstreamResult,
    UpstreamTransport, internal_fault_fallback,
};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Longest slice of an upstream error body echoed into `details`.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Outcome of the steps that can short-circuit before classification.
enum Failure {
    Unreachable(UnreachableCause),
    Internal(String),
}

/// Stateless forwarder shared by every endpoint handler.
#[derive(Clone)]
pub struct ForwardingGateway {
    upstream: Arc<dyn UpstreamTransport>,
}

impl ForwardingGateway {
    pub fn new(upstream: Arc<dyn UpstreamTransport>) -> Self {
        Self { upstream }
    }

    pub fn upstream(&self) -> &Arc<dyn UpstreamTransport> {
        &self.upstream
    }

    /// Validate, probe, forward and classify one call.
    #[instrument(
        skip(self, ctx, request, endpoint),
        fields(endpoint = %endpoint.id, request_id = %ctx.request_id)
    )]
    pub async fn handle(
        &self,
        ctx: &CallContext,
        request: ForwardRequest,
        endpoint: &EndpointConfig,
    ) -> GatewayResponse {
        let missing = request.missing(&endpoint.required_fields);
        if !missing.is_empty() {
            let details = format!("missing or empty: {}", missing.join(", "));
            return self.reject(ctx, endpoint, details);
        }

        if let Some(probe) = &endpoint.probe {
            if let Err(failure) = self.probe(probe).await {
                return self.degrade(ctx, &request, endpoint, failure);
            }
        }

        let call = UpstreamCall {
            endpoint_id: &endpoint.id,
            method: endpoint.method,
            path: &endpoint.upstream_path,
            request: &request,
            request_id: &ctx.request_id,
        };

        let result = match timeout(endpoint.call_timeout, self.upstream.send(call)).await {
            Err(_) => UpstreamResult::Unreachable(UnreachableCause::DeadlineElapsed(
                endpoint.call_timeout,
            )),
            Ok(Err(err)) if err.is_internal() => {
                return self.degrade(ctx, &request, endpoint, Failure::Internal(err.to_string()));
            }
            Ok(Err(err)) => UpstreamResult::Unreachable(UnreachableCause::Transport(err.to_string())),
            Ok(Ok(reply)) => UpstreamResult::from_reply(reply),
        };

        match result {
            UpstreamResult::Success {
                status,
                payload,
                content_type,
            } => {
                debug!(status, bytes = payload.len(), "relaying backend response");
                GatewayResponse::PassThrough {
                    status,
                    payload,
                    content_type,
                }
            }
            UpstreamResult::UpstreamError { status, body } => {
                let details = upstream_error_details(status, &body);
                self.degrade_with(ctx, &request, endpoint, FailureKind::UpstreamError, details)
            }
            UpstreamResult::Unreachable(cause) => {
                self.degrade(ctx, &request, endpoint, Failure::Unreachable(cause))
            }
        }
    }

    /// Answer with a validation failure without touching the backend.
    ///
    /// Also used by handlers when the inbound payload cannot be decoded.
    pub fn reject(
        &self,
        ctx: &CallContext,
        endpoint: &EndpointConfig,
        details: impl Into<String>,
    ) -> GatewayResponse {
        let details = details.into();
        info!(
            endpoint = %endpoint.id,
            status = FailureKind::Validation.status_code(),
            cause = %details,
            request_id = %ctx.request_id,
            classification = %FailureKind::Validation,
            "rejected request"
        );
        GatewayResponse::validation(details)
    }

    /// Bounded liveness check.  Any non-2xx answer counts as down.
    async fn probe(&self, probe: &ProbeConfig) -> Result<(), Failure> {
        match timeout(probe.timeout, self.upstream.probe(&probe.path)).await {
            Err(_) => Err(Failure::Unreachable(UnreachableCause::ProbeTimedOut(probe.timeout))),
            Ok(Ok(status)) if (200..300).contains(&status) => Ok(()),
            Ok(Ok(status)) => Err(Failure::Unreachable(UnreachableCause::ProbeFailed(format!(
                "health check returned status {status}"
            )))),
            Ok(Err(err @ TransportError::InvalidRequest(_))) => {
                Err(Failure::Internal(err.to_string()))
            }
            Ok(Err(err)) => Err(Failure::Unreachable(UnreachableCause::ProbeFailed(
                err.to_string(),
            ))),
        }
    }

    fn degrade(
        &self,
        ctx: &CallContext,
        request: &ForwardRequest,
        endpoint: &EndpointConfig,
        failure: Failure,
    ) -> GatewayResponse {
        match failure {
            Failure::Unreachable(cause) => self.degrade_with(
                ctx,
                request,
                endpoint,
                FailureKind::Unreachable,
                cause.to_string(),
            ),
            Failure::Internal(details) => {
                error!(
                    endpoint = %endpoint.id,
                    status = FailureKind::InternalFault.status_code(),
                    cause = %details,
                    request_id = %ctx.request_id,
                    classification = %FailureKind::InternalFault,
                    "gateway fault before contacting backend"
                );
                let fallback = internal_fault_fallback(&details, Utc::now());
                GatewayResponse::degraded(FailureKind::InternalFault, details, fallback)
            }
        }
    }

    /// Build the endpoint's fallback and render it per its degrade mode.
    fn degrade_with(
        &self,
        ctx: &CallContext,
        request: &ForwardRequest,
        endpoint: &EndpointConfig,
        kind: FailureKind,
        details: String,
    ) -> GatewayResponse {
        let fallback = endpoint.fallback.build(request, Utc::now());
        let response = match endpoint.degrade_mode {
            DegradeMode::Envelope => GatewayResponse::degraded(kind, details.clone(), fallback),
            DegradeMode::Annotated => GatewayResponse::annotated(kind, details.clone(), fallback),
        };

        warn!(
            endpoint = %endpoint.id,
            status = response.status(),
            cause = %details,
            request_id = %ctx.request_id,
            classification = %kind,
            fallback = endpoint.fallback.name(),
            backend = self.upstream.target(),
            "serving fallback"
        );
        response
    }
}

fn upstream_error_details(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("upstream returned status {status}");
    }
    let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("upstream returned status {status}: {snippet}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{AnalyzeFallback, KpiReadFallback};
    use bytes::Bytes;
    use market_intel_kernel::{GenericUnavailable, HttpMethod};
    use market_intel_testing::{MockUpstream, ProbeBehavior, SendBehavior, assert_upstream_calls};
    use serde_json::{Value, json};
    use std::time::Duration;

    fn analyze() -> EndpointConfig {
        EndpointConfig::new("analyze", HttpMethod::Post, "/analyze", Arc::new(AnalyzeFallback))
            .with_required_fields(["query_str", "market_domain_str"])
            .with_probe(ProbeConfig::new("/health", Duration::from_secs(5)))
            .with_call_timeout(Duration::from_secs(30))
    }

    fn analyze_request() -> ForwardRequest {
        ForwardRequest::new()
            .with_field("query_str", "q")
            .with_field("market_domain_str", "finance")
    }

    fn body_json(resp: GatewayResponse) -> Value {
        serde_json::from_slice(&resp.into_body()).unwrap()
    }

    #[tokio::test]
    async fn missing_field_makes_no_network_call() {
        let mock = MockUpstream::new();
        let gateway = ForwardingGateway::new(Arc::new(mock.clone()));
        let request = ForwardRequest::new()
            .with_field("query_str", "   ")
            .with_field("market_domain_str", "finance");

        let resp = gateway.handle(&CallContext::new("r1"), request, &analyze()).await;

        assert_eq!(resp.status(), 400);
        let body = body_json(resp);
        assert_eq!(body["error"], "Missing required fields");
        assert!(body["details"].as_str().unwrap().contains("query_str"));
        assert!(body.get("fallback_data").is_none());
        assert_upstream_calls!(mock, probes = 0, sends = 0);
    }

    #[tokio::test]
    async fn failed_probe_skips_forwarding() {
        let mock = MockUpstream::new().with_probe(ProbeBehavior::Status(503));
        let gateway = ForwardingGateway::new(Arc::new(mock.clone()));

        let resp = gateway
            .handle(&CallContext::new("r2"), analyze_request(), &analyze())
            .await;

        assert_eq!(resp.status(), 503);
        assert!(resp.fallback_data().is_some());
        let body = body_json(resp);
        assert_eq!(body["details"], "health probe failed: health check returned status 503");
        assert_upstream_calls!(mock, probes = 1, sends = 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_probe_times_out() {
        let mock = MockUpstream::new().with_probe(ProbeBehavior::Hang);
        let gateway = ForwardingGateway::new(Arc::new(mock.clone()));

        let resp = gateway
            .handle(&CallContext::new("r3"), analyze_request(), &analyze())
            .await;

        assert_eq!(resp.status(), 503);
        assert_eq!(body_json(resp)["details"], "health probe timed out after 5000 ms");
        assert_upstream_calls!(mock, probes = 1, sends = 0);
    }

    #[tokio::test(start_paused = true)]
    async fn forward_deadline_is_unreachable() {
        let mock = MockUpstream::new().with_send(SendBehavior::Hang);
        let gateway = ForwardingGateway::new(Arc::new(mock.clone()));

        let resp = gateway
            .handle(&CallContext::new("r4"), analyze_request(), &analyze())
            .await;

        assert_eq!(resp.status(), 503);
        let body = body_json(resp);
        assert_eq!(body["error"], "Backend service unavailable");
        assert_eq!(body["details"], "no response from backend within 30000 ms");
        assert_eq!(body["fallback_data"]["query"], "q");
        assert_upstream_calls!(mock, probes = 1, sends = 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_reply_inside_deadline_passes_through() {
        let mock = MockUpstream::new().with_send(SendBehavior::DelayedReply(
            Duration::from_secs(29),
            200,
            Bytes::from_static(br#"{"analysis":"done"}"#),
        ));
        let gateway = ForwardingGateway::new(Arc::new(mock));

        let resp = gateway
            .handle(&CallContext::new("r5"), analyze_request(), &analyze())
            .await;

        assert!(resp.is_pass_through());
        assert_eq!(resp.into_body(), Bytes::from_static(br#"{"analysis":"done"}"#));
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let mock = MockUpstream::replying_json(500, json!({ "detail": "boom" }));
        let gateway = ForwardingGateway::new(Arc::new(mock));

        let resp = gateway
            .handle(&CallContext::new("r6"), analyze_request(), &analyze())
            .await;

        assert_eq!(resp.status(), 502);
        let body = body_json(resp);
        assert_eq!(body["error"], "Backend request failed");
        assert!(body["details"].as_str().unwrap().contains("500"));
        assert_eq!(body["fallback_data"]["market_domain"], "finance");
    }

    #[tokio::test]
    async fn success_is_relayed_byte_for_byte() {
        let raw = Bytes::from_static(b"{ \"analysis\" : \"ok\" ,\"n\":1.50}");
        let mock = MockUpstream::new().with_send(SendBehavior::Reply(201, raw.clone()));
        let gateway = ForwardingGateway::new(Arc::new(mock.clone()));

        let resp = gateway
            .handle(&CallContext::new("r7"), analyze_request(), &analyze())
            .await;

        assert_eq!(resp.status(), 201);
        assert!(resp.fallback_data().is_none());
        assert_eq!(resp.into_body(), raw);

        let history = mock.history();
        assert_eq!(history[0].path, "/analyze");
        assert_eq!(history[0].request_id, "r7");
    }

    #[tokio::test]
    async fn invalid_outbound_request_is_internal_fault() {
        let mock = MockUpstream::new().with_send(SendBehavior::Fail(
            TransportError::InvalidRequest("bad header".to_string()),
        ));
        let gateway = ForwardingGateway::new(Arc::new(mock));

        let resp = gateway
            .handle(&CallContext::new("r8"), analyze_request(), &analyze())
            .await;

        assert_eq!(resp.status(), 500);
        let body = body_json(resp);
        assert_eq!(body["error"], "Internal server error");
        assert!(body["fallback_data"]["timestamp"].is_string());
        assert!(body["fallback_data"]["error"].is_string());
    }

    #[tokio::test]
    async fn annotated_endpoint_answers_200_when_down() {
        let endpoint =
            EndpointConfig::new("kpi_read", HttpMethod::Get, "/kpi", Arc::new(KpiReadFallback))
                .with_call_timeout(Duration::from_secs(10))
                .with_degrade_mode(DegradeMode::Annotated);
        let mock = MockUpstream::down();
        let gateway = ForwardingGateway::new(Arc::new(mock.clone()));

        let resp = gateway
            .handle(&CallContext::new("r9"), ForwardRequest::new(), &endpoint)
            .await;

        assert_eq!(resp.status(), 200);
        let body = body_json(resp);
        assert_eq!(body["metadata"]["source"], "fallback_data");
        assert!(body.get("revenue").is_some());
        assert_upstream_calls!(mock, probes = 0, sends = 1);
    }

    #[tokio::test]
    async fn generic_fallback_when_endpoint_has_none_of_its_own() {
        let endpoint =
            EndpointConfig::new("misc", HttpMethod::Post, "/misc", Arc::new(GenericUnavailable));
        let gateway = ForwardingGateway::new(Arc::new(MockUpstream::down()));

        let resp = gateway
            .handle(&CallContext::new("r10"), ForwardRequest::new(), &endpoint)
            .await;

        assert_eq!(resp.status(), 503);
        assert_eq!(body_json(resp)["fallback_data"]["status"], "unavailable");
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1_000);
        let details = upstream_error_details(502, &body);
        assert!(details.starts_with("upstream returned status 502: "));
        assert!(details.len() < 300);
        assert_eq!(upstream_error_details(404, "  "), "upstream returned status 404");
    }
}
