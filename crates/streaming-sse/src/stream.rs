//! Async Stream support for SSE parsing

use crate::streaming_sse::{decode_event, SseDecoder, SseEvent};
use crate::types::StreamEvent;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Adapter that turns a byte stream into an SSE event stream
pub struct SseStream<S> {
    inner: S,
    decoder: SseDecoder,
    pending_events: VecDeque<SseEvent>,
    finished: bool,
}

impl<S> SseStream<S> {
    /// Create a new SSE stream from a byte stream
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            decoder: SseDecoder::new(),
            pending_events: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<SseEvent, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending_events.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.finished {
                return Poll::Ready(None);
            }
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.pending_events.extend(this.decoder.push(&chunk));
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    // Flush a final line the server sent without a terminator
                    this.pending_events.extend(this.decoder.finish());
                    this.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extension trait for byte streams to easily convert to SSE streams
pub trait SseStreamExt: Stream {
    /// Convert this byte stream into an SSE event stream
    fn into_sse_stream(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}

/// Decode a raw SSE byte stream into typed protocol events.
///
/// Malformed `data:` lines are skipped. The stream ends after the first
/// terminal event (`response.done` or `error`) or when the bytes run out.
/// Transport errors are passed through and end the stream.
pub fn decode_stream<S, E>(bytes: S) -> impl Stream<Item = Result<StreamEvent, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    async_stream::try_stream! {
        let mut raw_events = Box::pin(bytes).into_sse_stream();
        while let Some(raw) = raw_events.next().await {
            let raw = raw?;
            if let Some(event) = decode_event(&raw) {
                let terminal = event.is_terminal();
                yield event;
                if terminal {
                    return;
                }
            }
        }
    }
}
