//! Upstream transports.

mod http;

pub use http::{HttpUpstream, REQUEST_ID_HEADER};
