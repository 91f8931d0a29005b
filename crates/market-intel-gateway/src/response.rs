//! Rendering of [`GatewayResponse`] as an axum response.

use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use market_intel_kernel::GatewayResponse;
use market_intel_kernel::outcome::JSON_CONTENT_TYPE;

/// Relayed backend payloads keep the backend's content type; failure
/// envelopes and annotated fallback documents are JSON.
#[derive(Debug)]
pub struct ApiResponse(pub GatewayResponse);

impl From<GatewayResponse> for ApiResponse {
    fn from(resp: GatewayResponse) -> Self {
        Self(resp)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = HeaderValue::from_str(self.0.content_type())
            .unwrap_or_else(|_| HeaderValue::from_static(JSON_CONTENT_TYPE));
        (status, [(CONTENT_TYPE, content_type)], self.0.into_body()).into_response()
    }
}
