//! Semantic streaming events.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::types::ValidationError;

pub const EVENT_TEXT_DELTA: &str = "response.text.delta";
pub const EVENT_REASONING_DELTA: &str = "response.reasoning.delta";
pub const EVENT_DONE: &str = "response.done";
pub const EVENT_ERROR: &str = "error";
/// Default SSE event name for a frame without an `event:` line.
pub const EVENT_MESSAGE: &str = "message";

/// One decoded SSE frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamEvent {
    pub event: String,
    pub data: JsonMap<String, JsonValue>,
}

impl StreamEvent {
    pub fn new(event: impl Into<String>, data: JsonMap<String, JsonValue>) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Build an event from any JSON value. Only objects are valid payloads.
    pub fn from_parts(event: impl Into<String>, data: JsonValue) -> Result<Self, ValidationError> {
        match data {
            JsonValue::Object(map) => Ok(Self::new(event, map)),
            other => Err(ValidationError::new(format!(
                "stream event data must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn text_delta(delta: impl Into<String>) -> Self {
        Self::new(EVENT_TEXT_DELTA, delta_payload(delta.into()))
    }

    pub fn reasoning_delta(delta: impl Into<String>) -> Self {
        Self::new(EVENT_REASONING_DELTA, delta_payload(delta.into()))
    }

    pub fn done() -> Self {
        Self::new(EVENT_DONE, JsonMap::new())
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut data = JsonMap::new();
        data.insert("error".into(), JsonValue::String(message.into()));
        Self::new(EVENT_ERROR, data)
    }

    pub fn is_done(&self) -> bool {
        self.event == EVENT_DONE
    }

    pub fn is_error(&self) -> bool {
        self.event == EVENT_ERROR
    }

    /// `response.done` and `error` both end a stream; at most one of them is sent.
    pub fn is_terminal(&self) -> bool {
        self.is_done() || self.is_error()
    }

    /// The `delta` string, if the payload carries one.
    pub fn delta(&self) -> Option<&str> {
        self.data.get("delta").and_then(JsonValue::as_str)
    }

    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.data.get("error").and_then(JsonValue::as_str)
    }
}

fn delta_payload(delta: String) -> JsonMap<String, JsonValue> {
    let mut data = JsonMap::new();
    data.insert("delta".into(), JsonValue::String(delta));
    data
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
