use futures_core::Stream;
use futures_util::StreamExt;

use crate::core::SdkError;
use crate::types::{MessageItem, ReasoningItem, ResponseItem, StreamEvent, EVENT_REASONING_DELTA, EVENT_TEXT_DELTA};

/// Text folded out of a stream of semantic events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedResponse {
    /// Concatenated `response.reasoning.delta` fragments
    pub reasoning: String,
    /// Concatenated `response.text.delta` fragments
    pub text: String,
    /// The stream ended with `response.done`
    pub done: bool,
    /// Message of the terminal `error` event, if any
    pub error: Option<String>,
    /// Number of events seen, including unknown ones
    pub events: usize,
}

impl CollectedResponse {
    /// Fold one event. Unknown event names only bump the counter.
    pub fn push(&mut self, event: &StreamEvent) {
        self.events += 1;
        match event.event.as_str() {
            EVENT_TEXT_DELTA => {
                if let Some(delta) = event.delta() {
                    self.text.push_str(delta);
                }
            }
            EVENT_REASONING_DELTA => {
                if let Some(delta) = event.delta() {
                    self.reasoning.push_str(delta);
                }
            }
            _ if event.is_done() => self.done = true,
            _ if event.is_error() => {
                self.error = Some(event.error_message().unwrap_or_default().to_string());
            }
            _ => {}
        }
    }

    pub fn is_complete(&self) -> bool {
        self.done && self.error.is_none()
    }

    /// Items in the order a non-streaming response would carry them:
    /// reasoning first, then the assistant message. Empty parts are left out.
    pub fn into_items(self) -> Vec<ResponseItem> {
        let mut items = Vec::new();
        if !self.reasoning.is_empty() {
            items.push(ResponseItem::Reasoning(ReasoningItem {
                content: Some(self.reasoning),
                ..Default::default()
            }));
        }
        if !self.text.is_empty() {
            items.push(ResponseItem::Message(MessageItem::assistant(self.text)));
        }
        items
    }
}

/// Drain an event stream. The first transport or validation error is returned
/// as is; events before it are discarded.
pub async fn collect_stream<S>(events: S) -> Result<CollectedResponse, SdkError>
where
    S: Stream<Item = Result<StreamEvent, SdkError>>,
{
    let mut collected = CollectedResponse::default();
    futures_util::pin_mut!(events);
    while let Some(event) = events.next().await {
        collected.push(&event?);
    }
    Ok(collected)
}
