//! Request handlers for the gateway API

pub mod api;
pub mod health;

pub use api::api_router;
pub use health::health;
