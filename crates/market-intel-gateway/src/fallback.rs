//! Fallback payloads served when the analytics backend cannot answer.
//!
//! Each builder is seeded with the caller's original request so the
//! substitute echoes what was asked.  Builders are infallible: a field the
//! caller did not send is rendered as `null` (or a documented default).

use chrono::{DateTime, Utc};
use market_intel_kernel::fallback::timestamp;
use market_intel_kernel::outcome::FALLBACK_SOURCE;
use market_intel_kernel::{FallbackBuilder, ForwardRequest};
use serde_json::{Value, json};

/// Version reported by the offline agent-status document.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn echo(request: &ForwardRequest, field: &str) -> Value {
    request.get(field).cloned().unwrap_or(Value::Null)
}

fn echo_or(request: &ForwardRequest, field: &str, default: &str) -> Value {
    match request.get_str(field) {
        Some(s) if !s.trim().is_empty() => Value::String(s.to_string()),
        _ => Value::String(default.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis / chat
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/analyze`
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeFallback;

impl FallbackBuilder for AnalyzeFallback {
    fn name(&self) -> &str {
        "analyze"
    }

    fn build(&self, request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "query": echo(request, "query_str"),
            "market_domain": echo(request, "market_domain_str"),
            "analysis": "Market analysis is temporarily unavailable. The analytics service could not be reached, so no live data was used.",
            "recommendations": [
                "Retry the analysis in a few minutes",
                "Narrow the query to a single market segment",
                "Review previously generated reports in the meantime"
            ],
            "timestamp": timestamp(generated_at),
        })
    }
}

/// `POST /api/chat`
///
/// `context` echoes the caller's context object, or carries just the
/// `session_id` when none was sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatFallback;

impl FallbackBuilder for ChatFallback {
    fn name(&self) -> &str {
        "chat"
    }

    fn build(&self, request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "response": "I'm unable to reach the analysis service right now. Please try again shortly.",
            "session_id": echo(request, "session_id"),
            "context": chat_context(request),
            "suggestions": [
                "Ask again in a moment",
                "Check the latest KPI dashboard",
                "Start a new market analysis"
            ],
            "timestamp": timestamp(generated_at),
        })
    }
}

fn chat_context(request: &ForwardRequest) -> Value {
    match request.get("context") {
        Some(context @ Value::Object(_)) => context.clone(),
        _ => json!({ "session_id": echo(request, "session_id") }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// KPI
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/kpi`: the default dashboard document.
///
/// Requested `timeframe` and `category` are echoed; absent ones fall back to
/// `30d` and `all`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KpiReadFallback;

impl FallbackBuilder for KpiReadFallback {
    fn name(&self) -> &str {
        "kpi_read"
    }

    fn build(&self, request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "revenue": { "value": 0, "change": 0.0, "trend": "flat" },
            "customers": { "value": 0, "change": 0.0, "trend": "flat" },
            "conversion": { "value": 0.0, "change": 0.0, "trend": "flat" },
            "market_share": { "value": 0.0, "change": 0.0, "trend": "flat" },
            "metadata": {
                "timeframe": echo_or(request, "timeframe", "30d"),
                "category": echo_or(request, "category", "all"),
                "last_updated": timestamp(generated_at),
                "source": FALLBACK_SOURCE,
            },
        })
    }
}

/// `POST /api/kpi`
#[derive(Debug, Clone, Copy, Default)]
pub struct KpiWriteFallback;

impl FallbackBuilder for KpiWriteFallback {
    fn name(&self) -> &str {
        "kpi_write"
    }

    fn build(&self, request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "success": false,
            "metric": echo(request, "metric"),
            "value": echo(request, "value"),
            "stored": false,
            "timestamp": timestamp(generated_at),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/agent/status`
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentStatusFallback;

impl FallbackBuilder for AgentStatusFallback {
    fn name(&self) -> &str {
        "agent_status"
    }

    fn build(&self, _request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "status": "offline",
            "version": AGENT_VERSION,
            "capabilities": [],
            "file_types_supported": [],
            "timestamp": timestamp(generated_at),
        })
    }
}

/// `POST /api/agent/sync`
///
/// `sync_id` is echoed when the caller supplied one, otherwise `null`:
/// nothing was queued, so no id is minted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentSyncFallback;

impl FallbackBuilder for AgentSyncFallback {
    fn name(&self) -> &str {
        "agent_sync"
    }

    fn build(&self, request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "success": false,
            "action": echo(request, "action"),
            "sync_id": echo(request, "sync_id"),
            "queued": false,
            "timestamp": timestamp(generated_at),
        })
    }
}
