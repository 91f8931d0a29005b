use async_trait::async_trait;
use bytes::Bytes;
use market_intel_kernel::{
    ForwardRequest, HttpMethod, TransportError, UpstreamCall, UpstreamReply, UpstreamTransport,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock does when probed.
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    /// Answer `200`.
    Healthy,
    /// Answer with the given status.
    Status(u16),
    /// Fail at the transport level.
    Fail(TransportError),
    /// Never answer.
    Hang,
}

/// What the mock does when a call is forwarded.
#[derive(Debug, Clone)]
pub enum SendBehavior {
    /// Answer with status and body.
    Reply(u16, Bytes),
    /// Answer after sleeping for the given duration.
    DelayedReply(Duration, u16, Bytes),
    /// Fail at the transport level.
    Fail(TransportError),
    /// Never answer.
    Hang,
}

/// A forwarded call as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub request: ForwardRequest,
    pub request_id: String,
}

/// A scripted [`UpstreamTransport`].
///
/// It lets tests decide how the "backend" behaves and then assert how many
/// network operations the gateway actually attempted.
#[derive(Clone)]
pub struct MockUpstream {
    probe: Arc<Mutex<ProbeBehavior>>,
    send: Arc<Mutex<SendBehavior>>,
    probe_count: Arc<AtomicUsize>,
    send_count: Arc<AtomicUsize>,
    /// Track every forwarded call
    pub call_history: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUpstream {
    /// A healthy backend answering `200 {}`.
    pub fn new() -> Self {
        Self {
            probe: Arc::new(Mutex::new(ProbeBehavior::Healthy)),
            send: Arc::new(Mutex::new(SendBehavior::Reply(200, Bytes::from_static(b"{}")))),
            probe_count: Arc::new(AtomicUsize::new(0)),
            send_count: Arc::new(AtomicUsize::new(0)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A healthy backend answering `status` with `body` serialized as JSON.
    pub fn replying_json(status: u16, body: Value) -> Self {
        Self::new().with_send(SendBehavior::Reply(status, Bytes::from(body.to_string())))
    }

    /// A backend refusing every connection, probe included.
    pub fn down() -> Self {
        let refused = TransportError::Connect("connection refused".to_string());
        Self::new()
            .with_probe(ProbeBehavior::Fail(refused.clone()))
            .with_send(SendBehavior::Fail(refused))
    }

    pub fn with_probe(self, behavior: ProbeBehavior) -> Self {
        self.set_probe(behavior);
        self
    }

    pub fn with_send(self, behavior: SendBehavior) -> Self {
        self.set_send(behavior);
        self
    }

    pub fn set_probe(&self, behavior: ProbeBehavior) {
        if let Ok(mut probe) = self.probe.lock() {
            *probe = behavior;
        }
    }

    pub fn set_send(&self, behavior: SendBehavior) {
        if let Ok(mut send) = self.send.lock() {
            *send = behavior;
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Probes plus forwarded calls.
    pub fn network_calls(&self) -> usize {
        self.probe_count() + self.send_count()
    }

    /// Retrieve the history of forwarded calls
    pub fn history(&self) -> Vec<RecordedCall> {
        self.call_history
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn current_probe(&self) -> ProbeBehavior {
        self.probe
            .lock()
            .map(|b| b.clone())
            .unwrap_or(ProbeBehavior::Healthy)
    }

    fn current_send(&self) -> SendBehavior {
        self.send
            .lock()
            .map(|b| b.clone())
            .unwrap_or(SendBehavior::Hang)
    }
}

#[async_trait]
impl UpstreamTransport for MockUpstream {
    fn target(&self) -> &str {
        "mock-upstream"
    }

    async fn probe(&self, _path: &str) -> Result<u16, TransportError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        match self.current_probe() {
            ProbeBehavior::Healthy => Ok(200),
            ProbeBehavior::Status(status) => Ok(status),
            ProbeBehavior::Fail(err) => Err(err),
            ProbeBehavior::Hang => std::future::pending().await,
        }
    }

    async fn send(&self, call: UpstreamCall<'_>) -> Result<UpstreamReply, TransportError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.call_history.lock() {
            calls.push(RecordedCall {
                endpoint_id: call.endpoint_id.to_string(),
                method: call.method,
                path: call.path.to_string(),
                request: call.request.clone(),
                request_id: call.request_id.to_string(),
            });
        }

        match self.current_send() {
            SendBehavior::Reply(status, body) => Ok(UpstreamReply::new(status, body)),
            SendBehavior::DelayedReply(delay, status, body) => {
                tokio::time::sleep(delay).await;
                Ok(UpstreamReply::new(status, body))
            }
            SendBehavior::Fail(err) => Err(err),
            SendBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Assert how many probes and forwarded calls a [`MockUpstream`] received.
#[macro_export]
macro_rules! assert_upstream_calls {
    ($mock:expr, probes = $probes:expr, sends = $sends:expr) => {
        assert_eq!(
            $mock.probe_count(),
            $probes,
            "expected {} probe(s), got {}",
            $probes,
            $mock.probe_count()
        );
        assert_eq!(
            $mock.send_count(),
            $sends,
            "expected {} forwarded call(s), got {}",
            $sends,
            $mock.send_count()
        );
    };
}
