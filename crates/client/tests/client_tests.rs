use crate::client::{
    collect_stream, BlockingOpenResponsesClient, ClientConfig, CreateResponse, OpenResponsesClient,
};
use crate::core::error::{build_http_status_transport_error, TransportError};
use crate::core::transport::{ByteStream, HttpTransport, TransportConfig};
use crate::core::SdkError;
use crate::types::{MessageItem, OpenResponsesRequest, StreamEvent};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use serde_json::json;
use std::sync::{Arc, Mutex};

const STATUS_BODY: &str = r#"{"detail":"boom"}"#;

#[derive(Clone, Default)]
struct TestTransport {
    status: Option<u16>,
    body: Bytes,
    chunks: Vec<Bytes>,
    fail_after_chunks: bool,
    last_url: Arc<Mutex<Option<String>>>,
    last_body: Arc<Mutex<Option<serde_json::Value>>>,
    last_headers: Arc<Mutex<Option<Vec<(String, String)>>>>,
}

impl TestTransport {
    fn with_body(body: serde_json::Value) -> Self {
        Self {
            body: Bytes::from(body.to_string()),
            ..Default::default()
        }
    }

    fn with_chunks(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| Bytes::from(c.to_string())).collect(),
            ..Default::default()
        }
    }

    fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn record(&self, url: &str, headers: &[(String, String)], body: &serde_json::Value) {
        *self.last_url.lock().unwrap() = Some(url.to_string());
        *self.last_headers.lock().unwrap() = Some(headers.to_vec());
        *self.last_body.lock().unwrap() = Some(body.clone());
    }

    fn status_error(&self) -> Option<TransportError> {
        self.status.map(|status| {
            build_http_status_transport_error(status, STATUS_BODY.to_string(), Vec::new())
        })
    }

    fn last_body(&self) -> serde_json::Value {
        self.last_body.lock().unwrap().clone().expect("request sent")
    }

    fn last_header(&self, name: &str) -> Option<String> {
        self.last_headers
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|h| h.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()))
    }
}

struct TestStreamResponse {
    chunks: Vec<Bytes>,
    fail_after_chunks: bool,
}

#[async_trait]
impl HttpTransport for TestTransport {
    type StreamResponse = TestStreamResponse;

    fn into_stream(resp: Self::StreamResponse) -> (ByteStream, Vec<(String, String)>) {
        let mut items: Vec<Result<Bytes, TransportError>> =
            resp.chunks.into_iter().map(Ok).collect();
        if resp.fail_after_chunks {
            items.push(Err(TransportError::BodyRead("connection reset".into())));
        }
        (Box::pin(stream::iter(items)), Vec::new())
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
        _cfg: &TransportConfig,
    ) -> Result<Self::StreamResponse, TransportError> {
        self.record(url, headers, body);
        if let Some(err) = self.status_error() {
            return Err(err);
        }
        Ok(TestStreamResponse {
            chunks: self.chunks.clone(),
            fail_after_chunks: self.fail_after_chunks,
        })
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
        _cfg: &TransportConfig,
    ) -> Result<(Bytes, Vec<(String, String)>), TransportError> {
        self.record(url, headers, body);
        if let Some(err) = self.status_error() {
            return Err(err);
        }
        Ok((self.body.clone(), Vec::new()))
    }
}

fn client(transport: &TestTransport) -> OpenResponsesClient<TestTransport> {
    OpenResponsesClient::with_transport(
        ClientConfig::new("http://localhost:8001/").with_api_key("sk-test"),
        transport.clone(),
    )
}

fn sample_output() -> serde_json::Value {
    json!({
        "id": "resp_1",
        "object": "response",
        "created": 1_700_000_000,
        "model": "llama3",
        "output": [
            {"type": "reasoning", "content": "short"},
            {"type": "message", "role": "assistant", "content": "Hello!"}
        ]
    })
}

fn assert_status_503(err: &SdkError) {
    assert_eq!(err.status(), Some(503), "got {err:?}");
    assert_eq!(err.body(), Some(STATUS_BODY));
}

#[tokio::test]
async fn non_streaming_call_parses_output_and_sends_request() {
    let transport = TestTransport::with_body(sample_output());
    let output = client(&transport)
        .create("llama3", "Say hello", false, None)
        .await
        .expect("create")
        .into_output()
        .expect("non-streaming output");

    assert_eq!(output.id, "resp_1");
    assert_eq!(output.output.len(), 2);
    assert_eq!(output.output_text(), "Hello!");

    assert_eq!(
        transport.last_url.lock().unwrap().as_deref(),
        Some("http://localhost:8001/v1/responses")
    );
    assert_eq!(
        transport.last_body(),
        json!({"model": "llama3", "input": "Say hello", "stream": false})
    );
    assert_eq!(transport.last_header("authorization").as_deref(), Some("Bearer sk-test"));
    assert_eq!(transport.last_header("content-type").as_deref(), Some("application/json"));
}

#[tokio::test]
async fn max_tool_calls_is_sent_when_set() {
    let transport = TestTransport::with_body(sample_output());
    client(&transport)
        .create("m", vec![MessageItem::user("hi")], false, Some(2))
        .await
        .expect("create");

    let body = transport.last_body();
    assert_eq!(body["max_tool_calls"], 2);
    assert_eq!(body["input"][0], json!({"type": "message", "role": "user", "content": "hi"}));
}

#[tokio::test]
async fn invalid_success_body_is_a_validation_error() {
    let transport = TestTransport::with_body(json!({"id": "r", "model": "m"}));
    let err = client(&transport)
        .create_response(&OpenResponsesRequest::new("m", "hi"))
        .await
        .expect_err("missing fields");
    assert!(matches!(err, SdkError::Validation(_)), "got {err:?}");

    let transport = TestTransport {
        body: Bytes::from_static(b"<html>oops</html>"),
        ..Default::default()
    };
    let err = client(&transport)
        .create_response(&OpenResponsesRequest::new("m", "hi"))
        .await
        .expect_err("not json");
    assert!(matches!(err, SdkError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn non_streaming_503_is_a_transport_error() {
    let transport = TestTransport::with_status(503);
    let err = client(&transport)
        .create("m", "hi", false, None)
        .await
        .expect_err("503");
    assert_status_503(&err);
}

#[tokio::test]
async fn streaming_503_fails_before_any_event() {
    let transport = TestTransport::with_status(503);
    let err = client(&transport)
        .create("m", "hi", true, None)
        .await
        .expect_err("503");
    assert_status_503(&err);
    assert_eq!(transport.last_body()["stream"], true);
    assert_eq!(transport.last_header("accept").as_deref(), Some("text/event-stream"));
}

#[tokio::test]
async fn streaming_yields_deltas_then_done() {
    let transport = TestTransport::with_chunks(&[
        "event: response.reasoning.delta\ndata: {\"delta\":\"hmm\"}\n\n",
        "event: response.text.delta\ndata: {\"delta\":\"Hel\"}\n\nevent: response.text.del",
        "ta\ndata: {\"delta\":\"lo\"}\n\n",
        "event: response.text.delta\ndata: {\"delta\":\"!\"}\n\n",
        "event: response.done\ndata: {}\n\n",
    ]);
    let events: Vec<StreamEvent> = client(&transport)
        .create("m", "hi", true, None)
        .await
        .expect("create")
        .into_stream()
        .expect("stream")
        .map(|item| item.expect("event"))
        .collect()
        .await;

    assert_eq!(events.len(), 5);
    assert_eq!(events[0], StreamEvent::reasoning_delta("hmm"));
    assert_eq!(events.last(), Some(&StreamEvent::done()));
}

#[tokio::test]
async fn collect_stream_folds_text_and_reasoning() {
    let transport = TestTransport::with_chunks(&[
        "event: response.reasoning.delta\ndata: {\"delta\":\"a\"}\n\n",
        "event: response.text.delta\ndata: {not json}\n\n",
        "event: response.text.delta\ndata: {\"delta\":\"b\"}\n\n",
        "event: response.done\ndata: {}\n\n",
    ]);
    let stream = client(&transport)
        .create_response_stream(&OpenResponsesRequest::new("m", "hi"))
        .await
        .expect("stream");
    let collected = collect_stream(stream).await.expect("collected");

    assert_eq!(collected.reasoning, "a");
    assert_eq!(collected.text, "b");
    assert!(collected.is_complete());
    assert_eq!(collected.events, 3);
}

#[tokio::test]
async fn error_event_ends_the_stream_without_done() {
    let transport = TestTransport::with_chunks(&[
        "event: response.text.delta\ndata: {\"delta\":\"par\"}\n\n",
        "event: error\ndata: {\"error\":\"upstream exploded\"}\n\n",
        "event: response.done\ndata: {}\n\n",
    ]);
    let events: Vec<_> = client(&transport)
        .create_response_stream(&OpenResponsesRequest::new("m", "hi"))
        .await
        .expect("stream")
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    let last = events[1].as_ref().expect("error event");
    assert_eq!(last.error_message(), Some("upstream exploded"));
}

#[tokio::test]
async fn early_close_yields_stream_closed() {
    let transport = TestTransport::with_chunks(&["event: response.text.delta\ndata: {\"delta\":\"x\"}\n\n"]);
    let stream = client(&transport)
        .create_response_stream(&OpenResponsesRequest::new("m", "hi"))
        .await
        .expect("stream");
    let err = collect_stream(stream).await.expect_err("no terminal event");
    assert!(
        matches!(err, SdkError::Transport(TransportError::StreamClosed)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn mid_stream_read_failure_ends_iteration() {
    let transport = TestTransport {
        chunks: vec![Bytes::from_static(
            b"event: response.text.delta\ndata: {\"delta\":\"x\"}\n\n",
        )],
        fail_after_chunks: true,
        ..Default::default()
    };
    let items: Vec<_> = client(&transport)
        .create_response_stream(&OpenResponsesRequest::new("m", "hi"))
        .await
        .expect("stream")
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(
        items[1],
        Err(SdkError::Transport(TransportError::BodyRead(_)))
    ));
}

#[tokio::test]
async fn create_response_debug_hides_stream() {
    let transport = TestTransport::with_chunks(&["event: response.done\ndata: {}\n\n"]);
    let resp = client(&transport)
        .create("m", "hi", true, None)
        .await
        .expect("create");
    assert!(matches!(resp, CreateResponse::Stream(_)));
    assert_eq!(format!("{resp:?}"), "Stream(..)");
}

#[test]
fn blocking_client_matches_async_semantics() {
    let transport = TestTransport::with_body(sample_output());
    let blocking = BlockingOpenResponsesClient::with_transport(
        ClientConfig::new("http://localhost:8001"),
        transport.clone(),
    )
    .expect("runtime");

    let output = blocking
        .create("llama3", "hi", false, None)
        .expect("create")
        .into_output()
        .expect("output");
    assert_eq!(output.output_text(), "Hello!");
    assert_eq!(transport.last_header("authorization"), None);
}

#[test]
fn blocking_503_for_both_modes() {
    let blocking = BlockingOpenResponsesClient::with_transport(
        ClientConfig::new("http://localhost:8001"),
        TestTransport::with_status(503),
    )
    .expect("runtime");

    let err = blocking.create("m", "hi", false, None).expect_err("503");
    assert_status_503(&err);

    let err = blocking
        .create_response_stream(&OpenResponsesRequest::new("m", "hi"))
        .expect_err("503");
    assert_status_503(&err);
}

#[test]
fn blocking_stream_iterates_and_collects() {
    let chunks = [
        "event: response.text.delta\ndata: {\"delta\":\"a\"}\n\n",
        "event: response.text.delta\ndata: {\"delta\":\"b\"}\n\n",
        "event: response.text.delta\ndata: {\"delta\":\"c\"}\n\n",
        "event: response.done\ndata: {}\n\n",
    ];
    let blocking = BlockingOpenResponsesClient::with_transport(
        ClientConfig::new("http://localhost:8001"),
        TestTransport::with_chunks(&chunks),
    )
    .expect("runtime");

    let events: Vec<StreamEvent> = blocking
        .create("m", "hi", true, None)
        .expect("create")
        .into_stream()
        .expect("stream")
        .map(|item| item.expect("event"))
        .collect();
    assert_eq!(events.len(), 4);
    assert!(events[3].is_done());

    let collected = blocking
        .create_response_stream(&OpenResponsesRequest::new("m", "hi"))
        .expect("stream")
        .collect_output()
        .expect("collected");
    assert_eq!(collected.text, "abc");
    assert!(collected.done);
}
