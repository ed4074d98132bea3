//! The transport capability shared by every channel implementation.

use futures_core::Stream;
use mcpager_types::{JsonRpcRequest, TransportError};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A boxed, sendable future borrowed from a transport.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A lazy, finite, non-restartable sequence of decoded events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Value, TransportError>> + Send>>;

/// What a single [`Transport::receive`] produced.
pub enum Received {
    /// One complete decoded message.
    Message(Value),
    /// A streamed exchange: progress events followed (eventually) by the
    /// terminal response.
    Events(EventStream),
}

impl std::fmt::Debug for Received {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Received::Message(value) => f.debug_tuple("Message").field(value).finish(),
            Received::Events(_) => f.write_str("Events(..)"),
        }
    }
}

/// A bidirectional channel to one MCP server.
///
/// Dyn-compatible so a session can own a `Box<dyn Transport>` without knowing
/// which variant it drives.
pub trait Transport: Send {
    /// Serialize `message` onto the wire. Never waits for a response.
    fn send<'a>(&'a mut self, message: &'a JsonRpcRequest) -> BoxFuture<'a, Result<(), TransportError>>;

    /// Wait up to `timeout` for the next message or event stream.
    fn receive(&mut self, timeout: Duration) -> BoxFuture<'_, Result<Received, TransportError>>;

    /// Release the channel. Idempotent and infallible.
    fn close(&mut self) -> BoxFuture<'_, ()>;

    /// Transport name for logging (e.g., "stdio").
    fn name(&self) -> &str;
}

pub(crate) fn timeout_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
