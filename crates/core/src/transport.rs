use crate::core::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};

/// Response body of a streaming call, chunked however the network delivered it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Header list as sent or received; names are lower-case where the transport allows.
pub type Headers = Vec<(String, String)>;

/// Timeouts and body shaping shared by every call of a client.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Whole-call deadline for non-streaming requests. Streams are bounded by
    /// `connect_timeout` and `idle_read_timeout` instead.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// Longest allowed gap between two body chunks of a stream
    pub idle_read_timeout: Duration,
    /// Drop `null` object members from request bodies before sending
    pub strip_null_fields: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(60)),
            connect_timeout: Duration::from_secs(10),
            idle_read_timeout: Duration::from_secs(45),
            strip_null_fields: true,
        }
    }
}

/// Summary of one HTTP exchange, reported after it completes or fails.
///
/// For streams the exchange ends when the response head arrives; body chunks
/// are not reported.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub started_at: SystemTime,
    pub latency: Duration,
    pub method: &'static str,
    pub url: String,
    /// `None` when no response arrived
    pub status: Option<u16>,
    pub is_stream: bool,
    pub request_headers: Headers,
    pub response_headers: Headers,
    /// Body as sent, after null stripping
    pub request_body: Value,
    /// Raw body text, when it was read in full
    pub response_body: Option<String>,
    pub error: Option<String>,
}

pub trait TransportObserver: Send + Sync {
    fn on_event(&self, event: TransportEvent);
}

static OBSERVER: OnceLock<Arc<dyn TransportObserver>> = OnceLock::new();

/// Install the process-wide observer. Only the first call wins; returns
/// whether this one did.
pub fn set_transport_observer(observer: Arc<dyn TransportObserver>) -> bool {
    OBSERVER.set(observer).is_ok()
}

pub fn emit_transport_event(event: TransportEvent) {
    if let Some(observer) = OBSERVER.get() {
        observer.on_event(event);
    }
}

/// The HTTP seam between the protocol client and the network.
///
/// Implementations own connection handling. A non-2xx status must come back as
/// [`TransportError::HttpStatus`] carrying the raw body, before any streamed
/// byte is handed out.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Whatever a successful streaming POST hands back before the body is read.
    type StreamResponse: Send;

    /// Split a streaming response into its body chunks and response headers.
    fn into_stream(resp: Self::StreamResponse) -> (ByteStream, Headers);

    /// POST `body` as JSON and keep the response body open for streaming.
    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Self::StreamResponse, TransportError>;

    /// POST `body` as JSON and read the whole response body.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<(Bytes, Headers), TransportError>;
}
