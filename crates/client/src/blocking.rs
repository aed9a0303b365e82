//! Synchronous wrapper around [`OpenResponsesClient`].
//!
//! Each client owns a current-thread tokio runtime and drives the async
//! client on it, so results and errors are identical. Do not call these
//! methods from inside an async runtime.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::runtime::{Builder, Runtime};

use crate::client::collect::CollectedResponse;
use crate::client::{ClientConfig, CreateResponse, EventStream, OpenResponsesClient};
use crate::core::transport::HttpTransport;
use crate::core::{SdkError, TransportError};
use crate::transport_reqwest::ReqwestTransport;
use crate::types::{OpenResponsesOutput, OpenResponsesRequest, RequestInput, StreamEvent};

pub struct BlockingOpenResponsesClient<T: HttpTransport = ReqwestTransport> {
    inner: OpenResponsesClient<T>,
    runtime: Arc<Runtime>,
}

impl BlockingOpenResponsesClient<ReqwestTransport> {
    pub fn new(cfg: ClientConfig) -> Result<Self, SdkError> {
        Ok(Self {
            inner: OpenResponsesClient::new(cfg)?,
            runtime: build_runtime()?,
        })
    }

    pub fn from_env() -> Result<Self, SdkError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: HttpTransport> BlockingOpenResponsesClient<T> {
    pub fn with_transport(cfg: ClientConfig, http: T) -> Result<Self, SdkError> {
        Ok(Self {
            inner: OpenResponsesClient::with_transport(cfg, http),
            runtime: build_runtime()?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub fn create(
        &self,
        model: impl Into<String>,
        input: impl Into<RequestInput>,
        stream: bool,
        max_tool_calls: Option<u64>,
    ) -> Result<BlockingCreateResponse, SdkError> {
        let resp = self
            .runtime
            .block_on(self.inner.create(model, input, stream, max_tool_calls))?;
        Ok(match resp {
            CreateResponse::Output(output) => BlockingCreateResponse::Output(output),
            CreateResponse::Stream(stream) => {
                BlockingCreateResponse::Stream(BlockingEventStream::new(self.runtime.clone(), stream))
            }
        })
    }

    pub fn create_response(
        &self,
        request: &OpenResponsesRequest,
    ) -> Result<OpenResponsesOutput, SdkError> {
        self.runtime.block_on(self.inner.create_response(request))
    }

    pub fn create_response_stream(
        &self,
        request: &OpenResponsesRequest,
    ) -> Result<BlockingEventStream, SdkError> {
        let stream = self
            .runtime
            .block_on(self.inner.create_response_stream(request))?;
        Ok(BlockingEventStream::new(self.runtime.clone(), stream))
    }
}

fn build_runtime() -> Result<Arc<Runtime>, SdkError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|err| {
            SdkError::Transport(TransportError::Other(format!(
                "failed to start blocking runtime: {err}"
            )))
        })
}

/// Result of [`BlockingOpenResponsesClient::create`].
#[derive(Debug)]
pub enum BlockingCreateResponse {
    Output(OpenResponsesOutput),
    Stream(BlockingEventStream),
}

impl BlockingCreateResponse {
    pub fn into_output(self) -> Option<OpenResponsesOutput> {
        match self {
            BlockingCreateResponse::Output(output) => Some(output),
            BlockingCreateResponse::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<BlockingEventStream> {
        match self {
            BlockingCreateResponse::Stream(stream) => Some(stream),
            BlockingCreateResponse::Output(_) => None,
        }
    }
}

/// Pull-based event iterator. Each `next` blocks until the next event, a
/// transport error, or the end of the stream.
pub struct BlockingEventStream {
    inner: EventStream,
    runtime: Arc<Runtime>,
}

impl BlockingEventStream {
    fn new(runtime: Arc<Runtime>, inner: EventStream) -> Self {
        Self { inner, runtime }
    }

    /// Drain the remaining events into a [`CollectedResponse`].
    pub fn collect_output(self) -> Result<CollectedResponse, SdkError> {
        let mut collected = CollectedResponse::default();
        for event in self {
            collected.push(&event?);
        }
        Ok(collected)
    }
}

impl Iterator for BlockingEventStream {
    type Item = Result<StreamEvent, SdkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.inner.next())
    }
}

impl std::fmt::Debug for BlockingEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingEventStream").finish_non_exhaustive()
    }
}
