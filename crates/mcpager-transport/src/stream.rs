//! Async stream that turns an SSE response body into decoded JSON events.

use crate::sse::SseDecoder;
use futures_core::Stream;
use mcpager_types::TransportError;
use pin_project_lite::pin_project;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A stream of JSON events read from a `text/event-stream` body.
    ///
    /// Data lines that fail to decode are logged and skipped. The stream ends
    /// when the HTTP body ends.
    pub struct SseEventStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
        decoder: SseDecoder,
        ready: VecDeque<Value>,
        done: bool,
    }
}

impl SseEventStream {
    /// Create a new event stream from a reqwest byte stream.
    pub fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
            done: false,
        }
    }
}

fn decode_into(ready: &mut VecDeque<Value>, payloads: impl IntoIterator<Item = String>) {
    for data in payloads {
        match serde_json::from_str(&data) {
            Ok(event) => ready.push_back(event),
            Err(e) => tracing::warn!("Skipping invalid JSON chunk: {data} ({e})"),
        }
    }
}

impl Stream for SseEventStream {
    type Item = Result<Value, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if *this.done {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let payloads = this.decoder.feed(&bytes);
                    decode_into(&mut *this.ready, payloads);
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(TransportError::Io(e.to_string()))));
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    decode_into(&mut *this.ready, this.decoder.finish());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
