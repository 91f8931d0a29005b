//! Shared application state for the API handlers

use std::sync::Arc;

use crate::catalog::EndpointCatalog;
use crate::forward::ForwardingGateway;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Forwarder bound to the analytics backend
    pub gateway: ForwardingGateway,
    /// Validated endpoint rules
    pub catalog: Arc<EndpointCatalog>,
}

impl AppState {
    pub fn new(gateway: ForwardingGateway, catalog: EndpointCatalog) -> Self {
        Self {
            gateway,
            catalog: Arc::new(catalog),
        }
    }
}
