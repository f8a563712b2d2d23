//! Client behaviour against a scripted in-memory transport.

use async_trait::async_trait;
use gateway_client::{
    ChatRequest, GatewayClient, GatewayConfig, GatewayError, Message, MessageRole, Transport,
    TransportFailure, TransportRequest,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

fn completion(content: &str) -> Value {
    json!({
        "id": "gen-1",
        "model": "openai/gpt-4o-mini",
        "created": 1_718_000_000,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
    })
}

fn connect_failure(n: usize) -> TransportFailure {
    TransportFailure::Connect {
        message: format!("connection reset {n}"),
    }
}

/// Plays back a fixed script of outcomes and counts calls.
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value, TransportFailure>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<Value, TransportFailure>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &TransportRequest) -> Result<Value, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::Other {
                message: "script exhausted".to_string(),
            }))
    }
}

/// Holds every call until the test releases it.
struct GatedTransport {
    gate: Semaphore,
    started: AtomicUsize,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl GatedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn execute(&self, _request: &TransportRequest) -> Result<Value, TransportFailure> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let acquired = self.gate.acquire().await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        match acquired {
            Ok(permit) => permit.forget(),
            Err(_) => {
                return Err(TransportFailure::Other {
                    message: "gate closed".to_string(),
                })
            }
        }

        Ok(completion("ok"))
    }
}

fn config() -> GatewayConfig {
    GatewayConfig::builder()
        .api_key("sk-test")
        .retry_delay(Duration::from_millis(1))
        .retry_jitter(Duration::ZERO)
        .build()
        .unwrap()
}

fn client(transport: Arc<dyn Transport>) -> GatewayClient {
    GatewayClient::with_transport(config(), transport).unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::builder().user("Suggest a substitute for buttermilk.").build()
}

#[tokio::test]
async fn test_empty_messages_never_reach_transport() {
    let transport = ScriptedTransport::new(vec![Ok(completion("unused"))]);
    let client = client(transport.clone());

    let err = client.send(&ChatRequest::new(vec![])).await.unwrap_err();

    assert!(matches!(err, GatewayError::Validation { .. }));
    assert_eq!(err.field(), Some("messages"));
    assert_eq!(transport.calls(), 0);
    assert_eq!(client.throttle_stats().in_flight, 0);
}

#[tokio::test]
async fn test_out_of_range_parameters_never_reach_transport() {
    let transport = ScriptedTransport::new(vec![]);
    let client = client(transport.clone());

    for request in [
        ChatRequest::builder().user("hi").temperature(2.5).build(),
        ChatRequest::builder().user("hi").top_p(1.5).build(),
        ChatRequest::builder().user("hi").max_tokens(0).build(),
        ChatRequest::builder().user("hi").presence_penalty(-2.5).build(),
    ] {
        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation { .. }), "{err}");
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_role_never_reaches_transport() {
    let transport = ScriptedTransport::new(vec![]);
    let request = ChatRequest::new(vec![Message::new(
        MessageRole::Other("chef".to_string()),
        "hi",
    )]);

    let err = client(transport.clone()).send(&request).await.unwrap_err();

    assert_eq!(err.field(), Some("messages[0].role"));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    for failures in 0..=3 {
        let mut script: Vec<_> = (0..failures).map(|n| Err(connect_failure(n))).collect();
        script.push(Ok(completion("Use yogurt thinned with milk.")));
        let transport = ScriptedTransport::new(script);

        let response = client(transport.clone()).send(&request()).await.unwrap();

        assert_eq!(response.content(), Some("Use yogurt thinned with milk."));
        assert_eq!(transport.calls(), failures + 1);
    }
}

#[tokio::test]
async fn test_exhausted_retries_return_last_error() {
    let script = (0..4).map(|n| Err(connect_failure(n))).collect();
    let transport = ScriptedTransport::new(script);

    let err = client(transport.clone()).send(&request()).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::Network {
            message: "connection reset 3".to_string()
        }
    );
    assert_eq!(transport.calls(), 4);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Err(TransportFailure::Status {
        status: 400,
        message: "Invalid schema".to_string(),
        error_type: Some("invalid_request_error".to_string()),
        body: None,
    })]);

    let err = client(transport.clone()).send(&request()).await.unwrap_err();

    assert!(matches!(err, GatewayError::Api { status: 400, .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_timeout_is_terminal() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportFailure::DeadlineExceeded {
            timeout: Duration::from_secs(30),
        }),
        Ok(completion("unused")),
    ]);

    let err = client(transport.clone()).send(&request()).await.unwrap_err();

    assert_eq!(err, GatewayError::Timeout { timeout_ms: 30_000 });
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_empty_choices_surface_as_response_format() {
    let transport = ScriptedTransport::new(vec![Ok(json!({"choices": []}))]);

    let err = client(transport.clone()).send(&request()).await.unwrap_err();

    assert!(matches!(err, GatewayError::ResponseFormat { .. }));
    assert!(err.to_string().contains("choices array is empty"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_request_is_prepared_once() {
    let transport = ScriptedTransport::new(vec![
        Err(connect_failure(0)),
        Ok(completion("ok")),
    ]);

    client(transport.clone()).send(&request()).await.unwrap();

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
    assert_eq!(
        requests[0].url.as_str(),
        "https://openrouter.ai/api/v1/chat/completions"
    );
    assert_eq!(requests[0].body["model"], "openai/gpt-4o-mini");
    assert_eq!(requests[0].timeout, Duration::from_secs(30));
    assert_eq!(requests[0].headers["authorization"], "Bearer sk-test");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_five_calls_in_flight() {
    let transport = GatedTransport::new();
    let client = client(transport.clone());

    let handles: Vec<_> = (0..7)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.send(&request()).await })
        })
        .collect();

    while transport.started.load(Ordering::SeqCst) < 5 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(transport.started.load(Ordering::SeqCst), 5);
    assert_eq!(client.throttle_stats().in_flight, 5);

    transport.gate.add_permits(2);
    while transport.started.load(Ordering::SeqCst) < 7 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    transport.gate.add_permits(5);

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.content(), Some("ok"));
    }

    assert!(transport.peak.load(Ordering::SeqCst) <= 5);
    assert_eq!(client.throttle_stats().in_flight, 0);
}

#[tokio::test]
async fn test_dropped_send_releases_slot() {
    let transport = GatedTransport::new();
    let client = client(transport.clone());

    let handle = {
        let client = client.clone();
        tokio::spawn(async move { client.send(&request()).await })
    };
    while transport.started.load(Ordering::SeqCst) < 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(client.throttle_stats().in_flight, 1);

    handle.abort();
    let _ = handle.await;

    assert_eq!(client.throttle_stats().in_flight, 0);
}
