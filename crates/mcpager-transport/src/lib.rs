//! Transports that carry JSON-RPC messages between a session and an MCP server.
//!
//! Two implementations share the [`Transport`] capability: [`StdioTransport`]
//! speaks newline-delimited JSON over a child process's pipes, and
//! [`HttpTransport`] POSTs each request and reads either a plain JSON body or a
//! server-sent event stream.

mod http;
mod sse;
mod stdio;
mod stream;
mod transport;

pub use http::{HttpTransport, SESSION_ID_HEADER};
pub use stdio::{DEFAULT_GRACE_PERIOD, StdioTransport};
pub use stream::SseEventStream;
pub use transport::{BoxFuture, EventStream, Received, Transport};
