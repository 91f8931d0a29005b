//! Request-side data types for the forwarding contract.
//!
//! These types carry no runtime dependencies beyond `serde`, `serde_json`
//! and `uuid`, so they can be shared by the gateway runtime, transports and
//! test doubles alike.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method used for the upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether request fields travel as a JSON body (`true`) or as query
    /// parameters (`false`).
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ForwardRequest
// ─────────────────────────────────────────────────────────────────────────────

/// Inbound payload could not be turned into a [`ForwardRequest`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("request body must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A mapping of named fields to JSON values, produced from one inbound call.
///
/// Which fields are *required* is a property of the endpoint, not of the
/// request; every other field is passed through to the upstream verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForwardRequest {
    fields: Map<String, Value>,
}

impl ForwardRequest {
    /// An empty request (e.g. a read endpoint called without parameters).
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a JSON document; anything but an object is rejected.
    pub fn from_json(value: Value) -> Result<Self, RequestError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            Value::Null => Err(RequestError::NotAnObject("null")),
            Value::Bool(_) => Err(RequestError::NotAnObject("a boolean")),
            Value::Number(_) => Err(RequestError::NotAnObject("a number")),
            Value::String(_) => Err(RequestError::NotAnObject("a string")),
            Value::Array(_) => Err(RequestError::NotAnObject("an array")),
        }
    }

    /// Parse a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RequestError::MalformedJson(e.to_string()))?;
        Self::from_json(value)
    }

    /// Build a request from decoded query-string pairs.  Values stay strings;
    /// a repeated key keeps its last value.
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { fields }
    }

    /// Builder helper: set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a field, if present and a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// `true` when the field exists, is not `null` and, if a string, is not
    /// blank.
    pub fn is_present(&self, name: &str) -> bool {
        match self.fields.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Names from `required` that are missing or empty, in declaration order.
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.is_present(name))
            .map(String::as_str)
            .collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten the fields into query-string pairs.  Strings are sent as-is,
    /// `null` is dropped and every other value is sent as its JSON text.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Call context
// ─────────────────────────────────────────────────────────────────────────────

/// Per-call context handed to the gateway alongside the request.
///
/// `identity` is the outcome of the session gate that ran *before* the
/// gateway; the gateway only carries it into logs and never checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Correlates log events with the response returned to the caller.
    pub request_id: String,
    /// Identity resolved by the session collaborator, if any.
    pub identity: Option<String>,
}

impl CallContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            identity: None,
        }
    }

    /// Fresh context with a random v4 request id.
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Builder helper: attach the caller's identity.
    pub fn with_identity(mut self, identity: Option<String>) -> Self {
        self.identity = identity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_reports_absent_null_and_blank_fields() {
        let req = ForwardRequest::from_json(json!({
            "query_str": "ai adoption",
            "market_domain_str": "   ",
            "session_id": null,
        }))
        .unwrap();

        let names = required(&["query_str", "market_domain_str", "session_id", "message"]);
        assert_eq!(
            req.missing(&names),
            vec!["market_domain_str", "session_id", "message"]
        );
    }

    #[test]
    fn non_string_values_count_as_present() {
        let req = ForwardRequest::new()
            .with_field("value", 0)
            .with_field("flags", json!([]))
            .with_field("enabled", false);
        assert!(req.missing(&required(&["value", "flags", "enabled"])).is_empty());
    }

    #[test]
    fn from_slice_rejects_non_objects() {
        assert_eq!(
            ForwardRequest::from_slice(b"[1, 2]"),
            Err(RequestError::NotAnObject("an array"))
        );
        assert!(matches!(
            ForwardRequest::from_slice(b"{not json"),
            Err(RequestError::MalformedJson(_))
        ));
        assert!(matches!(
            ForwardRequest::from_slice(b""),
            Err(RequestError::MalformedJson(_))
        ));
    }

    #[test]
    fn query_pairs_stringify_non_string_values() {
        let req = ForwardRequest::new()
            .with_field("timeframe", "30d")
            .with_field("limit", 5)
            .with_field("cursor", Value::Null);

        let mut pairs = req.to_query_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("limit".to_string(), "5".to_string()),
                ("timeframe".to_string(), "30d".to_string()),
            ]
        );
    }

    #[test]
    fn from_query_keeps_last_duplicate() {
        let req = ForwardRequest::from_query([("category", "retail"), ("category", "technology")]);
        assert_eq!(req.get_str("category"), Some("technology"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let req = ForwardRequest::new().with_field("message", "hi");
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "message": "hi" }));
    }

    #[test]
    fn body_methods() {
        assert!(HttpMethod::Post.sends_body());
        assert!(!HttpMethod::Get.sends_body());
        assert!(!HttpMethod::Delete.sends_body());
        assert_eq!(serde_json::to_value(HttpMethod::Patch).unwrap(), json!("PATCH"));
    }
}
