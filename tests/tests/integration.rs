use bytes::Bytes;
use market_intel_kernel::{
    ForwardRequest, HttpMethod, TransportError, UpstreamCall, UpstreamTransport,
};
use market_intel_testing::{MockUpstream, ProbeBehavior, SendBehavior};
use serde_json::json;
use std::time::Duration;

fn call<'a>(request: &'a ForwardRequest) -> UpstreamCall<'a> {
    UpstreamCall {
        endpoint_id: "chat",
        method: HttpMethod::Post,
        path: "/chat",
        request,
        request_id: "req-1",
    }
}

#[tokio::test]
async fn test_mock_upstream_records_calls() {
    let mock = MockUpstream::replying_json(200, json!({ "response": "hello" }));
    let request = ForwardRequest::new()
        .with_field("message", "hi")
        .with_field("session_id", "s-1");

    assert_eq!(mock.network_calls(), 0);

    let reply = mock.send(call(&request)).await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, Bytes::from(json!({ "response": "hello" }).to_string()));

    let history = mock.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].path, "/chat");
    assert_eq!(history[0].request.get_str("message"), Some("hi"));

    market_intel_testing::assert_upstream_calls!(mock, probes = 0, sends = 1);
}

#[tokio::test]
async fn test_down_upstream_fails_probe_and_send() {
    let mock = MockUpstream::down();
    let request = ForwardRequest::new();

    assert!(matches!(mock.probe("/health").await, Err(TransportError::Connect(_))));
    assert!(matches!(mock.send(call(&request)).await, Err(TransportError::Connect(_))));
    market_intel_testing::assert_upstream_calls!(mock, probes = 1, sends = 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_probe_never_resolves() {
    let mock = MockUpstream::new().with_probe(ProbeBehavior::Hang);
    let outcome = tokio::time::timeout(Duration::from_secs(1), mock.probe("/health")).await;
    assert!(outcome.is_err());
    assert_eq!(mock.probe_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_reply_waits() {
    let mock = MockUpstream::new().with_send(SendBehavior::DelayedReply(
        Duration::from_secs(10),
        201,
        Bytes::from_static(b"{}"),
    ));
    let request = ForwardRequest::new();

    let started = tokio::time::Instant::now();
    let reply = mock.send(call(&request)).await.unwrap();
    assert_eq!(reply.status, 201);
    assert!(started.elapsed() >= Duration::from_secs(10));
}
