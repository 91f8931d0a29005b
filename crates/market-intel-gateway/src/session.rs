//! Session gate in front of the API routes.
//!
//! The gateway performs no authentication itself.  The gate extracts the
//! session cookie and hands it to a [`SessionValidator`] (the identity
//! provider seam); a resolved identity travels with the request as a
//! [`SessionIdentity`] extension, anything else is redirected to login.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

use crate::settings::SessionSettings;

/// Query parameter carrying the originally requested path.
pub const REDIRECT_PARAM: &str = "redirect_to";

/// Opaque identity resolved by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity(pub String);

/// Resolves a session token into an identity.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `None` when the token does not identify a live session.
    async fn validate(&self, token: &str) -> Option<String>;
}

/// Accepts any non-blank token.
///
/// Stands in for the identity provider: it proves a session cookie was
/// presented, nothing more.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePresenceValidator;

#[async_trait]
impl SessionValidator for CookiePresenceValidator {
    async fn validate(&self, token: &str) -> Option<String> {
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

/// Decides which paths need a session and where to send callers without one.
pub struct SessionGate {
    settings: SessionSettings,
    validator: Arc<dyn SessionValidator>,
}

impl SessionGate {
    pub fn new(settings: SessionSettings, validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            settings,
            validator,
        }
    }

    pub fn with_presence_check(settings: SessionSettings) -> Self {
        Self::new(settings, Arc::new(CookiePresenceValidator))
    }

    pub fn enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Exact match, or prefix match for entries ending in `/*`.
    pub fn is_public(&self, path: &str) -> bool {
        self.settings.public_paths.iter().any(|public| {
            match public.strip_suffix("/*") {
                Some(prefix) => path == prefix || path.starts_with(&format!("{prefix}/")),
                None => path == public,
            }
        })
    }

    /// Resolve the identity carried by `headers`, if any.
    pub async fn identify(&self, headers: &HeaderMap) -> Option<SessionIdentity> {
        let token = session_cookie(headers, &self.settings.cookie_name)?;
        self.validator.validate(&token).await.map(SessionIdentity)
    }

    /// `{login_path}?redirect_to={original}`
    pub fn login_location(&self, original: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(REDIRECT_PARAM, original)
            .finish();
        format!("{}?{}", self.settings.login_path, query)
    }
}

/// Find `name` among the request's cookies.
fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Middleware: admit public paths and identified callers, redirect the rest.
pub async fn require_session(
    State(gate): State<Arc<SessionGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !gate.enabled() || gate.is_public(&path) {
        return next.run(request).await;
    }

    let identity = gate.identify(request.headers()).await;
    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => {
            let original = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(&path);
            let location = gate.login_location(original);
            debug!(path = %original, location = %location, "no session, redirecting to login");
            Redirect::temporary(&location).into_response()
        }
    }
}
