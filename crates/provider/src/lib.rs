//! Helpers for servers that implement Open Responses on top of a chat backend.
//!
//! A typical adapter maps the incoming request to chat messages with
//! [`map_request_to_messages`], calls its backend, and answers with either
//! [`output_from_completion`] or the frames produced by [`encode_delta_stream`].

use std::fmt::Display;

use futures_core::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::streaming_sse::{encode_frame, encode_json, DONE_FRAME};
use crate::types::{
    MessageItem, OpenResponsesOutput, OpenResponsesRequest, ReasoningItem, RequestInput,
    ResponseItem, Role, EVENT_ERROR, EVENT_REASONING_DELTA, EVENT_TEXT_DELTA,
};

const TARGET: &str = "open_responses::provider";

/// Message in the shape most chat-completion backends accept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Flatten request input into backend messages, preserving order.
///
/// A string input becomes one user message. Structured content is joined
/// without a separator.
pub fn map_request_to_messages(request: &OpenResponsesRequest) -> Vec<ChatMessage> {
    match &request.input {
        RequestInput::Text(text) => vec![ChatMessage {
            role: Role::User,
            content: text.clone(),
        }],
        RequestInput::Items(items) => items
            .iter()
            .map(|item| ChatMessage {
                role: item.role,
                content: item.content.joined_text(),
            })
            .collect(),
    }
}

/// Encode one SSE frame. Payloads that cannot be serialized become `{}`.
pub fn create_sse_event<T: Serialize + ?Sized>(event: &str, data: &T) -> String {
    match serde_json::to_value(data) {
        Ok(value) => encode_json(event, &value),
        Err(error) => {
            debug!(target: TARGET, event, %error, "payload not serializable, sending empty object");
            encode_frame(event, "{}")
        }
    }
}

pub fn create_text_delta(delta: &str) -> String {
    create_sse_event(EVENT_TEXT_DELTA, &json!({ "delta": delta }))
}

pub fn create_reasoning_delta(delta: &str) -> String {
    create_sse_event(EVENT_REASONING_DELTA, &json!({ "delta": delta }))
}

pub fn create_done_event() -> String {
    DONE_FRAME.to_string()
}

/// Terminal frame for a failed generation. No `response.done` follows it.
pub fn create_error_event(message: &str) -> String {
    create_sse_event(EVENT_ERROR, &json!({ "error": message }))
}

/// A finished, non-streaming backend completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatCompletion {
    pub id: String,
    /// Unix timestamp in seconds
    pub created: i64,
    pub content: Option<String>,
    pub reasoning: Option<String>,
}

impl ChatCompletion {
    /// Completion from a backend that supplies neither an id nor a timestamp:
    /// gets a fresh `resp_` id and the current time.
    pub fn new(content: Option<String>, reasoning: Option<String>) -> Self {
        Self {
            id: new_response_id(),
            created: unix_timestamp(),
            content,
            reasoning,
        }
    }
}

/// Build the response envelope: a reasoning item when reasoning text exists,
/// then the assistant message when content exists.
pub fn output_from_completion(
    completion: ChatCompletion,
    model: impl Into<String>,
) -> OpenResponsesOutput {
    let mut output = Vec::new();
    if let Some(reasoning) = completion.reasoning.filter(|r| !r.is_empty()) {
        output.push(ResponseItem::Reasoning(ReasoningItem {
            content: Some(reasoning),
            ..Default::default()
        }));
    }
    if let Some(content) = completion.content.filter(|c| !c.is_empty()) {
        output.push(ResponseItem::Message(MessageItem::assistant(content)));
    }
    OpenResponsesOutput::new(completion.id, completion.created, model, output)
}

/// One streamed backend chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDelta {
    pub content: Option<String>,
    pub reasoning: Option<String>,
}

impl ChatDelta {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            reasoning: None,
        }
    }

    pub fn reasoning(reasoning: impl Into<String>) -> Self {
        Self {
            content: None,
            reasoning: Some(reasoning.into()),
        }
    }
}

/// Turn backend chunks into SSE frames.
///
/// Per chunk the reasoning delta comes before the text delta; empty fragments
/// produce nothing. A clean end yields `response.done`. The first upstream
/// error yields one `error` frame and ends the stream.
pub fn encode_delta_stream<S, E>(upstream: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = Result<ChatDelta, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut upstream = Box::pin(upstream);
        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(delta) => {
                    if let Some(reasoning) = delta.reasoning.as_deref().filter(|r| !r.is_empty()) {
                        yield create_reasoning_delta(reasoning);
                    }
                    if let Some(content) = delta.content.as_deref().filter(|c| !c.is_empty()) {
                        yield create_text_delta(content);
                    }
                }
                Err(err) => {
                    let message = err.to_string();
                    debug!(target: TARGET, error = %message, "upstream failed mid-stream");
                    yield create_error_event(&message);
                    return;
                }
            }
        }
        yield create_done_event();
    }
}

/// `resp_` followed by a random v4 UUID.
pub fn new_response_id() -> String {
    format!("resp_{}", uuid::Uuid::new_v4().simple())
}

/// Current Unix time in seconds, for backends that omit `created`.
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
