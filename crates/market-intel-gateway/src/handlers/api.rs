//! Forwarding endpoints
//!
//! POST /api/analyze       - market analysis
//! POST /api/chat          - analyst chat
//! GET  /api/kpi           - KPI dashboard (always 200)
//! POST /api/kpi           - record a KPI value
//! GET  /api/agent/status  - agent status
//! POST /api/agent/sync    - trigger an agent sync
//!
//! Bodies are taken as raw bytes rather than through `Json` so that a
//! malformed or non-object body is answered with the gateway's own 400
//! document instead of the framework's plain-text rejection.

use axum::{
    Extension, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
    routing::{get, post},
};
use market_intel_kernel::{CallContext, EndpointConfig, ForwardRequest};

use crate::backend::REQUEST_ID_HEADER;
use crate::response::ApiResponse;
use crate::session::SessionIdentity;
use crate::state::AppState;

type Identity = Option<Extension<SessionIdentity>>;
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Reuse the caller's request id when it sent one.
fn call_context(headers: &HeaderMap, identity: Identity) -> CallContext {
    let ctx = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(CallContext::new)
        .unwrap_or_else(CallContext::generate);
    ctx.with_identity(identity.map(|Extension(SessionIdentity(id))| id))
}

async fn forward_body(
    state: &AppState,
    endpoint: &EndpointConfig,
    ctx: CallContext,
    body: &[u8],
) -> ApiResponse {
    // An empty body is an empty request; the required-field check reports it.
    let parsed = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(ForwardRequest::new())
    } else {
        ForwardRequest::from_slice(body)
    };

    match parsed {
        Ok(request) => state.gateway.handle(&ctx, request, endpoint).await.into(),
        Err(err) => state.gateway.reject(&ctx, endpoint, err.to_string()).into(),
    }
}

async fn forward_query(
    state: &AppState,
    endpoint: &EndpointConfig,
    ctx: CallContext,
    query: QueryPairs,
) -> ApiResponse {
    match query {
        Ok(Query(pairs)) => {
            let request = ForwardRequest::from_query(pairs);
            state.gateway.handle(&ctx, request, endpoint).await.into()
        }
        Err(rejection) => state
            .gateway
            .reject(&ctx, endpoint, rejection.body_text())
            .into(),
    }
}

/// POST /api/analyze
pub async fn analyze(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    let ctx = call_context(&headers, identity);
    forward_body(&state, &state.catalog.analyze, ctx, &body).await
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    let ctx = call_context(&headers, identity);
    forward_body(&state, &state.catalog.chat, ctx, &body).await
}

/// GET /api/kpi
pub async fn kpi_read(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    query: QueryPairs,
) -> ApiResponse {
    let ctx = call_context(&headers, identity);
    forward_query(&state, &state.catalog.kpi_read, ctx, query).await
}

/// POST /api/kpi
pub async fn kpi_write(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    let ctx = call_context(&headers, identity);
    forward_body(&state, &state.catalog.kpi_write, ctx, &body).await
}

/// GET /api/agent/status
pub async fn agent_status(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    query: QueryPairs,
) -> ApiResponse {
    let ctx = call_context(&headers, identity);
    forward_query(&state, &state.catalog.agent_status, ctx, query).await
}

/// POST /api/agent/sync
pub async fn agent_sync(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    let ctx = call_context(&headers, identity);
    forward_body(&state, &state.catalog.agent_sync, ctx, &body).await
}

/// Build the API router sub-tree
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/chat", post(chat))
        .route("/api/kpi", get(kpi_read).post(kpi_write))
        .route("/api/agent/status", get(agent_status))
        .route("/api/agent/sync", post(agent_sync))
}
