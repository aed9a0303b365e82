//! Open Responses: a typed data model, SSE codec, and HTTP clients for the
//! `POST /v1/responses` protocol, plus helpers for servers that speak it.

#[path = "../crates/sdk-types/src/lib.rs"]
pub mod types;
#[path = "../crates/core/src/lib.rs"]
pub mod core;
#[path = "../crates/streaming-sse/src/lib.rs"]
pub mod streaming_sse;
#[path = "../crates/transports/reqwest/src/lib.rs"]
pub mod transport_reqwest;
#[path = "../crates/client/src/lib.rs"]
pub mod client;
#[path = "../crates/provider/src/lib.rs"]
pub mod provider;

pub mod transports {
    pub use crate::transport_reqwest as reqwest;
}

pub use crate::client::{
    collect_stream, BlockingCreateResponse, BlockingEventStream, BlockingOpenResponsesClient,
    ClientConfig, CollectedResponse, CreateResponse, EventStream, OpenResponsesClient,
};
pub use crate::core::{HttpTransport, SdkError, TransportConfig, TransportError};
pub use crate::types::{
    InputText, MessageContent, MessageItem, OpenResponsesOutput, OpenResponsesRequest,
    ReasoningItem, RequestInput, ResponseItem, Role, StreamEvent, ToolCallItem, ValidationError,
};

#[cfg(test)]
#[path = "../crates/transports/reqwest/tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "../crates/sdk-types/tests/model_tests.rs"]
mod sdk_types_model_tests;
#[cfg(test)]
#[path = "../crates/streaming-sse/tests/decoder_tests.rs"]
mod streaming_sse_decoder_tests;
#[cfg(test)]
#[path = "../crates/streaming-sse/tests/stream_tests.rs"]
mod streaming_sse_stream_tests;
#[cfg(test)]
#[path = "../crates/transports/reqwest/tests/transport_tests.rs"]
mod transport_reqwest_tests;
#[cfg(test)]
#[path = "../crates/client/tests/client_tests.rs"]
mod client_tests;
#[cfg(test)]
#[path = "../crates/client/tests/loopback_tests.rs"]
mod client_loopback_tests;
#[cfg(test)]
#[path = "../crates/provider/tests/mapping_tests.rs"]
mod provider_mapping_tests;
