//! Open Responses data model
//!
//! Typed items (messages, reasoning blocks, tool calls), the request and
//! response envelopes, and the semantic streaming event. Every type here is a
//! plain value: it parses from JSON, serializes back to the same JSON, and
//! holds no references into other values.

pub mod event;
pub mod validation;

pub use event::{
    StreamEvent, EVENT_DONE, EVENT_ERROR, EVENT_MESSAGE, EVENT_REASONING_DELTA, EVENT_TEXT_DELTA,
};
pub use validation::ValidationError;

use self::event::json_kind;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Roles a message can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Wire tag for [`InputText`]. Absent tags default to `input_text`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
enum InputTextTag {
    #[default]
    #[serde(rename = "input_text")]
    InputText,
}

/// A text input block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputText {
    #[serde(rename = "type", default)]
    tag: InputTextTag,
    pub text: String,
}

impl InputText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            tag: InputTextTag::InputText,
            text: text.into(),
        }
    }
}

/// Message content: either a raw string or an ordered list of text blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<InputText>),
}

impl MessageContent {
    /// Flatten the content into one string. Blocks are joined without a separator.
    pub fn joined_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts.iter().map(|p| p.text.as_str()).collect(),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

impl From<Vec<InputText>> for MessageContent {
    fn from(value: Vec<InputText>) -> Self {
        MessageContent::Parts(value)
    }
}

/// A chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageItem {
    pub role: Role,
    pub content: MessageContent,
}

impl MessageItem {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }
}

/// A visible reasoning block. Which fields are filled depends on the backend;
/// a block with none of them is legal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasoningItem {
    /// Raw reasoning trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Sanitized summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Provider-sealed reasoning, opaque to callers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
}

impl ReasoningItem {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.summary.is_none() && self.encrypted_content.is_none()
    }
}

/// A requested tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallItem {
    pub id: String,
    pub name: String,
    pub arguments: JsonMap<String, JsonValue>,
}

/// One generated item. The `type` field on the wire picks the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseItem {
    Message(MessageItem),
    Reasoning(ReasoningItem),
    ToolCall(ToolCallItem),
}

impl ResponseItem {
    /// The discriminator string used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseItem::Message(_) => "message",
            ResponseItem::Reasoning(_) => "reasoning",
            ResponseItem::ToolCall(_) => "tool_call",
        }
    }

    pub fn as_message(&self) -> Option<&MessageItem> {
        match self {
            ResponseItem::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_reasoning(&self) -> Option<&ReasoningItem> {
        match self {
            ResponseItem::Reasoning(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCallItem> {
        match self {
            ResponseItem::ToolCall(t) => Some(t),
            _ => None,
        }
    }
}

impl From<MessageItem> for ResponseItem {
    fn from(value: MessageItem) -> Self {
        ResponseItem::Message(value)
    }
}

impl From<ReasoningItem> for ResponseItem {
    fn from(value: ReasoningItem) -> Self {
        ResponseItem::Reasoning(value)
    }
}

impl From<ToolCallItem> for ResponseItem {
    fn from(value: ToolCallItem) -> Self {
        ResponseItem::ToolCall(value)
    }
}

/// Request input: a string shorthand for one user message, or message items.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestInput {
    Text(String),
    #[serde(serialize_with = "serialize_message_items")]
    Items(Vec<MessageItem>),
}

impl From<&str> for RequestInput {
    fn from(value: &str) -> Self {
        RequestInput::Text(value.to_string())
    }
}

impl From<String> for RequestInput {
    fn from(value: String) -> Self {
        RequestInput::Text(value)
    }
}

impl From<Vec<MessageItem>> for RequestInput {
    fn from(value: Vec<MessageItem>) -> Self {
        RequestInput::Items(value)
    }
}

/// Input items travel as `type: "message"` items.
fn serialize_message_items<S: Serializer>(
    items: &[MessageItem],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(items.iter().cloned().map(ResponseItem::Message))
}

impl<'de> Deserialize<'de> for RequestInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        match JsonValue::deserialize(deserializer)? {
            JsonValue::String(text) => Ok(RequestInput::Text(text)),
            JsonValue::Array(raw) => raw
                .into_iter()
                .enumerate()
                .map(|(idx, value)| {
                    match serde_json::from_value::<ResponseItem>(value)
                        .map_err(|err| D::Error::custom(format!("input[{idx}]: {err}")))?
                    {
                        ResponseItem::Message(message) => Ok(message),
                        other => Err(D::Error::custom(format!(
                            "input[{idx}]: input items must be messages, found `{}`",
                            other.kind()
                        ))),
                    }
                })
                .collect::<Result<Vec<_>, _>>()
                .map(RequestInput::Items),
            other => Err(D::Error::custom(format!(
                "input must be a string or a list of message items, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Request body for `POST /v1/responses`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenResponsesRequest {
    pub model: String,
    pub input: RequestInput,
    #[serde(default)]
    pub stream: bool,
    /// Cap on provider-managed tool loops
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_calls: Option<u64>,
}

impl OpenResponsesRequest {
    pub fn new(model: impl Into<String>, input: impl Into<RequestInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            stream: false,
            max_tool_calls: None,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_max_tool_calls(mut self, max_tool_calls: Option<u64>) -> Self {
        self.max_tool_calls = max_tool_calls;
        self
    }

    pub fn from_json(s: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(s).map_err(ValidationError::from)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(ValidationError::from)
    }

    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string(self).map_err(ValidationError::from)
    }

    pub fn to_value(&self) -> Result<JsonValue, ValidationError> {
        serde_json::to_value(self).map_err(ValidationError::from)
    }
}

/// The `object` literal on a response envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseObject;

impl ResponseObject {
    pub const TAG: &'static str = "response";
}

impl Serialize for ResponseObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::TAG)
    }
}

impl<'de> Deserialize<'de> for ResponseObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        if tag == Self::TAG {
            Ok(ResponseObject)
        } else {
            Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(&tag),
                &"the literal \"response\"",
            ))
        }
    }
}

/// Non-streaming response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenResponsesOutput {
    pub id: String,
    #[serde(default)]
    pub object: ResponseObject,
    /// Unix timestamp in seconds
    pub created: i64,
    pub model: String,
    pub output: Vec<ResponseItem>,
}

impl OpenResponsesOutput {
    pub fn new(
        id: impl Into<String>,
        created: i64,
        model: impl Into<String>,
        output: Vec<ResponseItem>,
    ) -> Self {
        Self {
            id: id.into(),
            object: ResponseObject,
            created,
            model: model.into(),
            output,
        }
    }

    pub fn from_json(s: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(s).map_err(ValidationError::from)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(bytes).map_err(ValidationError::from)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(ValidationError::from)
    }

    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string(self).map_err(ValidationError::from)
    }

    pub fn to_value(&self) -> Result<JsonValue, ValidationError> {
        serde_json::to_value(self).map_err(ValidationError::from)
    }

    /// Concatenated text of all assistant messages, in output order.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(ResponseItem::as_message)
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.joined_text())
            .collect()
    }
}
