//! Market Intelligence Testing Framework
//!
//! Provides utilities for testing the forwarding gateway without a live
//! analytics backend.

pub mod upstream;

pub use upstream::{MockUpstream, ProbeBehavior, RecordedCall, SendBehavior};
