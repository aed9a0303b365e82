//! # Server-Sent Events (SSE) codec
//!
//! Transport-agnostic SSE framing for the Open Responses protocol.
//!
//! This module provides:
//! - `SseEvent`: one raw `data:` line paired with the event name in force
//! - `SseDecoder`: incremental, chunk-boundary safe line decoder
//! - `decode_event`: raw event to typed [`StreamEvent`], skipping malformed payloads
//! - `encode_*`: outbound frame builders

use crate::types::{StreamEvent, EVENT_DONE, EVENT_MESSAGE};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

/// Terminal frame for a successfully completed stream.
pub const DONE_FRAME: &str = "event: response.done\ndata: {}\n\n";

/// A single `data:` line together with the event name pending in its frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name from the frame's `event:` line, if any
    pub event: Option<String>,
    /// Data payload, exactly as sent after `data:`
    pub data: String,
}

impl SseEvent {
    /// Create a new SSE event with just data
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    /// Set the event type
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Event name, falling back to the SSE default `message`.
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or(EVENT_MESSAGE)
    }
}

/// Incremental SSE decoder that handles chunk boundaries correctly.
///
/// Each `data:` line yields one [`SseEvent`] named by the most recent
/// `event:` line. Blank lines are ignored, so a name stays in force until the
/// next `event:` line replaces it.
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,
    /// Event name set by the latest `event:` line seen so far
    pending_event: Option<String>,
    /// Queue of completed events ready to be yielded
    event_queue: VecDeque<SseEvent>,
}

impl SseDecoder {
    /// Create a new SSE decoder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            pending_event: None,
            event_queue: VecDeque::new(),
        }
    }

    /// Push new data chunk and get any complete events
    ///
    /// Partial lines are buffered until their terminator arrives.
    pub fn push(&mut self, chunk: &[u8]) -> impl Iterator<Item = SseEvent> + '_ {
        self.buffer.extend_from_slice(chunk);
        self.process_buffer(false);
        self.event_queue.drain(..)
    }

    /// Check if decoder has buffered data that might be incomplete
    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Finalize the stream and flush a trailing line that lacks its terminator.
    pub fn finish(&mut self) -> impl Iterator<Item = SseEvent> + '_ {
        self.process_buffer(true);
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(&String::from_utf8_lossy(&line));
        }
        self.pending_event = None;
        self.event_queue.drain(..)
    }

    fn process_buffer(&mut self, at_eof: bool) {
        while let Some((line_len, terminator_len)) = find_line_end(&self.buffer, at_eof) {
            let line = self
                .buffer
                .drain(..line_len + terminator_len)
                .take(line_len)
                .collect::<Vec<_>>();
            self.process_line(&String::from_utf8_lossy(&line));
        }
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() || line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, rest)) => (field, rest.strip_prefix(' ').unwrap_or(rest)),
            None => (line, ""),
        };

        match field {
            "event" => self.pending_event = Some(value.to_string()),
            "data" => self.event_queue.push_back(SseEvent {
                event: self.pending_event.clone(),
                data: value.to_string(),
            }),
            _ => {} // id, retry and unknown fields carry nothing for this protocol
        }
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the first line terminator: returns `(line_len, terminator_len)`.
///
/// A lone `\r` at the end of the buffer may be the first half of `\r\n`, so it
/// only counts as a terminator once the stream has ended.
fn find_line_end(buf: &[u8], at_eof: bool) -> Option<(usize, usize)> {
    let idx = buf.iter().position(|b| *b == b'\n' || *b == b'\r')?;
    if buf[idx] == b'\n' {
        return Some((idx, 1));
    }
    match buf.get(idx + 1) {
        Some(b'\n') => Some((idx, 2)),
        Some(_) => Some((idx, 1)),
        None if at_eof => Some((idx, 1)),
        None => None,
    }
}

/// Turn a raw SSE event into a typed [`StreamEvent`].
///
/// Payloads that are not JSON objects are skipped, never fatal.
pub fn decode_event(raw: &SseEvent) -> Option<StreamEvent> {
    let value: Value = match serde_json::from_str(&raw.data) {
        Ok(value) => value,
        Err(error) => {
            debug!(
                target: "open_responses::sse",
                event = raw.event_name(),
                %error,
                "skipping data line that is not valid JSON"
            );
            return None;
        }
    };
    match StreamEvent::from_parts(raw.event_name(), value) {
        Ok(event) => Some(event),
        Err(error) => {
            debug!(
                target: "open_responses::sse",
                event = raw.event_name(),
                %error,
                "skipping data line with a non-object payload"
            );
            None
        }
    }
}

/// Encode one frame from an event name and an already serialized payload.
pub fn encode_frame(event: &str, data: &str) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// Encode one frame from a JSON value.
pub fn encode_json(event: &str, data: &Value) -> String {
    encode_frame(event, &data.to_string())
}

/// Encode one frame from any serializable payload.
pub fn encode_event<T: Serialize + ?Sized>(
    event: &str,
    payload: &T,
) -> Result<String, serde_json::Error> {
    Ok(encode_frame(event, &serde_json::to_string(payload)?))
}

impl StreamEvent {
    /// Encode this event as an SSE frame. `response.done` always encodes to [`DONE_FRAME`].
    pub fn to_sse(&self) -> String {
        if self.event == EVENT_DONE && self.data.is_empty() {
            return DONE_FRAME.to_string();
        }
        encode_json(&self.event, &Value::Object(self.data.clone()))
    }
}

pub mod stream;
pub use stream::{decode_stream, SseStream, SseStreamExt};
