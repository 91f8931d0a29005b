//! Upstream results, failure classification and the response handed back to
//! callers.
//!
//! ```text
//!   UpstreamReply ──► UpstreamResult ──► GatewayResponse
//!                     Success          ─► PassThrough (status preserved)
//!                     UpstreamError    ─► Degraded / Annotated (502)
//!                     Unreachable      ─► Degraded / Annotated (503)
//! ```
//!
//! The status attached to each [`FailureKind`] lives in exactly one place,
//! [`FailureKind::status_code`], so every endpoint agrees on it.

use bytes::Bytes;
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Duration;

use crate::transport::UpstreamReply;

/// Status used by annotated (read) endpoints when serving a fallback document.
pub const ANNOTATED_STATUS: u16 = 200;

/// Marker written to `metadata.source` of annotated fallback documents.
pub const FALLBACK_SOURCE: &str = "fallback_data";

/// Content type of every body the gateway renders itself.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ─────────────────────────────────────────────────────────────────────────────
// Failure classification
// ─────────────────────────────────────────────────────────────────────────────

/// Classification of a call that did not end in an upstream success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Caller fault: a required field is missing or the payload is malformed.
    Validation,
    /// The upstream answered with a non-success status.
    UpstreamError,
    /// Probe failure, deadline elapsed or transport failure.
    Unreachable,
    /// The gateway failed on its own, without contacting the upstream.
    InternalFault,
}

impl FailureKind {
    /// The HTTP status every endpoint reports for this classification.
    pub const fn status_code(self) -> u16 {
        match self {
            FailureKind::Validation => 400,
            FailureKind::UpstreamError => 502,
            FailureKind::Unreachable => 503,
            FailureKind::InternalFault => 500,
        }
    }

    /// Short, machine-stable label used as the `error` field.
    pub const fn label(self) -> &'static str {
        match self {
            FailureKind::Validation => "Missing required fields",
            FailureKind::UpstreamError => "Backend request failed",
            FailureKind::Unreachable => "Backend service unavailable",
            FailureKind::InternalFault => "Internal server error",
        }
    }

    /// Snake-case tag for structured logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::UpstreamError => "upstream_error",
            FailureKind::Unreachable => "unreachable",
            FailureKind::InternalFault => "internal_fault",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the upstream was classified unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnreachableCause {
    /// The liveness probe answered with a failure or could not connect.
    ProbeFailed(String),
    /// The liveness probe did not answer within its timeout.
    ProbeTimedOut(Duration),
    /// The forwarding call did not complete within its deadline.
    DeadlineElapsed(Duration),
    /// Connection or body-read failure during the forwarding call.
    Transport(String),
}

impl fmt::Display for UnreachableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableCause::ProbeFailed(reason) => write!(f, "health probe failed: {reason}"),
            UnreachableCause::ProbeTimedOut(after) => {
                write!(f, "health probe timed out after {} ms", after.as_millis())
            }
            UnreachableCause::DeadlineElapsed(after) => {
                write!(f, "no response from backend within {} ms", after.as_millis())
            }
            UnreachableCause::Transport(reason) => f.write_str(reason),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UpstreamResult
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of contacting the upstream for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResult {
    /// 2xx answer; `payload` is the untouched response body.
    Success {
        status: u16,
        payload: Bytes,
        content_type: Option<String>,
    },
    /// Non-2xx answer.
    UpstreamError { status: u16, body: String },
    /// No usable answer at all.
    Unreachable(UnreachableCause),
}

impl UpstreamResult {
    /// Classify a reply purely by its status code.
    pub fn from_reply(reply: UpstreamReply) -> Self {
        if (200..300).contains(&reply.status) {
            UpstreamResult::Success {
                status: reply.status,
                payload: reply.body,
                content_type: reply.content_type,
            }
        } else {
            UpstreamResult::UpstreamError {
                status: reply.status,
                body: String::from_utf8_lossy(&reply.body).into_owned(),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayResponse
// ─────────────────────────────────────────────────────────────────────────────

/// Error envelope returned for a failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct Degraded {
    pub kind: FailureKind,
    /// Free-text cause.
    pub details: String,
    /// Always `Some` unless `kind` is [`FailureKind::Validation`].
    pub fallback_data: Option<Value>,
}

/// The value returned to the caller of the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    /// Upstream success, body, status and content type untouched.
    PassThrough {
        status: u16,
        payload: Bytes,
        content_type: Option<String>,
    },
    /// `{ error, details, fallback_data }` with the kind's status.
    Degraded(Degraded),
    /// Fallback document served in place of the upstream document, with
    /// `metadata.source == "fallback_data"`, status 200.
    Annotated {
        kind: FailureKind,
        details: String,
        payload: Value,
    },
}

impl GatewayResponse {
    /// Validation failure: no fallback payload.
    pub fn validation(details: impl Into<String>) -> Self {
        GatewayResponse::Degraded(Degraded {
            kind: FailureKind::Validation,
            details: details.into(),
            fallback_data: None,
        })
    }

    /// Post-validation failure rendered as an error envelope.
    pub fn degraded(kind: FailureKind, details: impl Into<String>, fallback_data: Value) -> Self {
        GatewayResponse::Degraded(Degraded {
            kind,
            details: details.into(),
            fallback_data: Some(fallback_data),
        })
    }

    /// Post-validation failure rendered as an annotated fallback document.
    ///
    /// Non-object payloads are wrapped as `{ "data": payload }` so the
    /// metadata marker always has somewhere to live.
    pub fn annotated(kind: FailureKind, details: impl Into<String>, payload: Value) -> Self {
        let details = details.into();
        let mut document = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        let metadata = document
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(meta) = metadata {
            meta.insert("source".to_string(), Value::String(FALLBACK_SOURCE.to_string()));
            meta.insert("fallback_reason".to_string(), Value::String(details.clone()));
        }

        GatewayResponse::Annotated {
            kind,
            details,
            payload: Value::Object(document),
        }
    }

    /// HTTP status for this response.
    pub fn status(&self) -> u16 {
        match self {
            GatewayResponse::PassThrough { status, .. } => *status,
            GatewayResponse::Degraded(d) => d.kind.status_code(),
            GatewayResponse::Annotated { .. } => ANNOTATED_STATUS,
        }
    }

    /// Content type to send; the upstream's for relayed bodies, JSON otherwise.
    pub fn content_type(&self) -> &str {
        match self {
            GatewayResponse::PassThrough {
                content_type: Some(content_type),
                ..
            } => content_type,
            _ => JSON_CONTENT_TYPE,
        }
    }

    pub fn fallback_data(&self) -> Option<&Value> {
        match self {
            GatewayResponse::PassThrough { .. } => None,
            GatewayResponse::Degraded(d) => d.fallback_data.as_ref(),
            GatewayResponse::Annotated { payload, .. } => Some(payload),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, GatewayResponse::PassThrough { .. })
    }

    /// Render the JSON body sent to the caller.
    pub fn into_body(self) -> Bytes {
        match self {
            GatewayResponse::PassThrough { payload, .. } => payload,
            GatewayResponse::Degraded(d) => {
                let mut body = json!({
                    "error": d.kind.label(),
                    "details": d.details,
                });
                if let (Some(fallback), Value::Object(map)) = (d.fallback_data, &mut body) {
                    map.insert("fallback_data".to_string(), fallback);
                }
                Bytes::from(body.to_string())
            }
            GatewayResponse::Annotated { payload, .. } => Bytes::from(payload.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_stable() {
        assert_eq!(FailureKind::Validation.status_code(), 400);
        assert_eq!(FailureKind::UpstreamError.status_code(), 502);
        assert_eq!(FailureKind::Unreachable.status_code(), 503);
        assert_eq!(FailureKind::InternalFault.status_code(), 500);
    }

    #[test]
    fn reply_classification_uses_2xx_range() {
        let ok = UpstreamReply::new(204, Bytes::new())
            .with_content_type(Some("text/plain".to_string()));
        assert_eq!(
            UpstreamResult::from_reply(ok),
            UpstreamResult::Success {
                status: 204,
                payload: Bytes::new(),
                content_type: Some("text/plain".to_string()),
            }
        );

        let redirect = UpstreamReply::new(302, Bytes::from_static(b"moved"));
        assert_eq!(
            UpstreamResult::from_reply(redirect),
            UpstreamResult::UpstreamError {
                status: 302,
                body: "moved".to_string()
            }
        );
    }

    #[test]
    fn validation_body_has_no_fallback_key() {
        let resp = GatewayResponse::validation("missing or empty: message");
        assert_eq!(resp.status(), 400);
        let body: Value = serde_json::from_slice(&resp.into_body()).unwrap();
        assert_eq!(body["error"], "Missing required fields");
        assert!(body.get("fallback_data").is_none());
    }

    #[test]
    fn degraded_body_carries_envelope() {
        let resp = GatewayResponse::degraded(
            FailureKind::Unreachable,
            "health probe timed out after 5000 ms",
            json!({ "status": "unavailable" }),
        );
        assert_eq!(resp.status(), 503);
        let body: Value = serde_json::from_slice(&resp.into_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Backend service unavailable",
                "details": "health probe timed out after 5000 ms",
                "fallback_data": { "status": "unavailable" },
            })
        );
    }

    #[test]
    fn annotated_merges_into_existing_metadata() {
        let resp = GatewayResponse::annotated(
            FailureKind::UpstreamError,
            "upstream returned status 500",
            json!({ "revenue": {}, "metadata": { "timeframe": "30d" } }),
        );
        assert_eq!(resp.status(), 200);
        let body: Value = serde_json::from_slice(&resp.into_body()).unwrap();
        assert_eq!(body["metadata"]["source"], "fallback_data");
        assert_eq!(body["metadata"]["timeframe"], "30d");
        assert!(body.get("revenue").is_some());
    }

    #[test]
    fn annotated_wraps_non_objects() {
        let resp = GatewayResponse::annotated(FailureKind::Unreachable, "down", json!([1, 2]));
        let payload = resp.fallback_data().unwrap();
        assert_eq!(payload["data"], json!([1, 2]));
        assert_eq!(payload["metadata"]["source"], "fallback_data");
    }

    #[test]
    fn unreachable_cause_display() {
        assert_eq!(
            UnreachableCause::DeadlineElapsed(Duration::from_secs(30)).to_string(),
            "no response from backend within 30000 ms"
        );
        assert_eq!(
            UnreachableCause::ProbeFailed("health check returned status 503".into()).to_string(),
            "health probe failed: health check returned status 503"
        );
    }
}
