//! Open Responses protocol client.
//!
//! [`OpenResponsesClient`] is the async client; [`blocking::BlockingOpenResponsesClient`]
//! wraps it for synchronous callers. Both speak to any server exposing
//! `POST {base_url}/v1/responses` and report failures as [`SdkError`].

pub mod blocking;
pub mod collect;
pub mod config;

pub use blocking::{BlockingCreateResponse, BlockingEventStream, BlockingOpenResponsesClient};
pub use collect::{collect_stream, CollectedResponse};
pub use config::ClientConfig;

use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;
use tracing::debug;

use crate::core::transport::{ByteStream, HttpTransport};
use crate::core::{SdkError, TransportError};
use crate::streaming_sse::decode_stream;
use crate::transport_reqwest::ReqwestTransport;
use crate::types::{OpenResponsesOutput, OpenResponsesRequest, RequestInput, StreamEvent};

const TARGET: &str = "open_responses::client";

/// Lazily decoded events of one streaming call.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, SdkError>> + Send>>;

/// Result of [`OpenResponsesClient::create`]; the variant follows the `stream` flag.
pub enum CreateResponse {
    Output(OpenResponsesOutput),
    Stream(EventStream),
}

impl CreateResponse {
    pub fn into_output(self) -> Option<OpenResponsesOutput> {
        match self {
            CreateResponse::Output(output) => Some(output),
            CreateResponse::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<EventStream> {
        match self {
            CreateResponse::Stream(stream) => Some(stream),
            CreateResponse::Output(_) => None,
        }
    }
}

impl std::fmt::Debug for CreateResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateResponse::Output(output) => f.debug_tuple("Output").field(output).finish(),
            CreateResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Async client. Holds no per-call state, so one instance can serve
/// concurrent calls.
pub struct OpenResponsesClient<T: HttpTransport = ReqwestTransport> {
    cfg: ClientConfig,
    http: T,
}

impl OpenResponsesClient<ReqwestTransport> {
    pub fn new(cfg: ClientConfig) -> Result<Self, SdkError> {
        cfg.validate()?;
        let http = ReqwestTransport::try_new(&cfg.transport)?;
        Ok(Self { cfg, http })
    }

    pub fn from_env() -> Result<Self, SdkError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: HttpTransport> OpenResponsesClient<T> {
    pub fn with_transport(cfg: ClientConfig, http: T) -> Self {
        Self { cfg, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn transport(&self) -> &T {
        &self.http
    }

    pub async fn create(
        &self,
        model: impl Into<String>,
        input: impl Into<RequestInput>,
        stream: bool,
        max_tool_calls: Option<u64>,
    ) -> Result<CreateResponse, SdkError> {
        let request = OpenResponsesRequest::new(model, input)
            .with_stream(stream)
            .with_max_tool_calls(max_tool_calls);
        if stream {
            self.create_response_stream(&request)
                .await
                .map(CreateResponse::Stream)
        } else {
            self.create_response(&request)
                .await
                .map(CreateResponse::Output)
        }
    }

    /// Send the request with `stream: false` and parse the whole body.
    pub async fn create_response(
        &self,
        request: &OpenResponsesRequest,
    ) -> Result<OpenResponsesOutput, SdkError> {
        let url = self.cfg.endpoint_url();
        let body = request_body(request, false)?;
        let headers = self.cfg.request_headers(false);
        debug!(target: TARGET, %url, model = %request.model, "create response");

        let (bytes, _res_headers) = self
            .http
            .post_json(&url, &headers, &body, &self.cfg.transport)
            .await?;
        let output = OpenResponsesOutput::from_slice(&bytes)?;
        debug!(
            target: TARGET,
            id = %output.id,
            items = output.output.len(),
            "response parsed"
        );
        Ok(output)
    }

    /// Send the request with `stream: true`. A non-2xx status fails here,
    /// before any event is produced.
    pub async fn create_response_stream(
        &self,
        request: &OpenResponsesRequest,
    ) -> Result<EventStream, SdkError> {
        let url = self.cfg.endpoint_url();
        let body = request_body(request, true)?;
        let headers = self.cfg.request_headers(true);
        debug!(target: TARGET, %url, model = %request.model, "create response stream");

        let resp = self
            .http
            .post_json_stream(&url, &headers, &body, &self.cfg.transport)
            .await?;
        let (bytes, _res_headers) = T::into_stream(resp);
        Ok(event_stream(bytes))
    }
}

fn request_body(request: &OpenResponsesRequest, stream: bool) -> Result<Value, SdkError> {
    let mut body = request.to_value()?;
    if let Some(map) = body.as_object_mut() {
        map.insert("stream".into(), Value::Bool(stream));
    }
    Ok(body)
}

/// Decode transport bytes into events and surface an early close as
/// [`TransportError::StreamClosed`].
pub(crate) fn event_stream(bytes: ByteStream) -> EventStream {
    Box::pin(terminated_events(bytes))
}

fn terminated_events(bytes: ByteStream) -> impl Stream<Item = Result<StreamEvent, SdkError>> + Send {
    async_stream::try_stream! {
        let mut events = Box::pin(decode_stream(bytes));
        let mut terminated = false;
        while let Some(event) = events.next().await {
            let event = event?;
            terminated = event.is_terminal();
            yield event;
        }
        if !terminated {
            debug!(target: TARGET, "stream ended without a terminal event");
            Err::<(), _>(TransportError::StreamClosed)?;
        }
    }
}
