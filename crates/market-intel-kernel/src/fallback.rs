//! Fallback payload builders.
//!
//! A [`FallbackBuilder`] synthesizes the best-effort substitute returned when
//! the upstream cannot serve a call.  Builders are infallible: they always
//! produce *some* JSON document, falling back to a generic unavailability
//! marker when the domain has nothing better to offer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::types::ForwardRequest;

/// Builds the `fallback_data` payload for one endpoint.
pub trait FallbackBuilder: Send + Sync {
    /// Stable name used in logs and `Debug` output.
    fn name(&self) -> &str;

    /// Build the substitute payload from the original request fields.
    fn build(&self, request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value;
}

/// RFC 3339 / ISO 8601 rendering used for every generated timestamp.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Minimal payload for gateway-side faults: just the detail and the time.
pub fn internal_fault_fallback(details: &str, generated_at: DateTime<Utc>) -> Value {
    json!({
        "error": details,
        "timestamp": timestamp(generated_at),
    })
}

/// Generic unavailability marker for endpoints with no meaningful substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericUnavailable;

impl FallbackBuilder for GenericUnavailable {
    fn name(&self) -> &str {
        "generic-unavailable"
    }

    fn build(&self, _request: &ForwardRequest, generated_at: DateTime<Utc>) -> Value {
        json!({
            "status": "unavailable",
            "message": "The analytics service is temporarily unavailable. Please try again later.",
            "timestamp": timestamp(generated_at),
        })
    }
}
