//! One logical connection to an MCP server.
//!
//! Every exchange holds the exchange lock from id generation until the
//! response (or terminal streamed event) has been interpreted, so at most one
//! request is ever in flight per session.

use crate::id::RequestIds;
use futures_util::StreamExt;
use mcpager_transport::{EventStream, HttpTransport, Received, StdioTransport, Transport};
use mcpager_types::{
    JsonRpcMessage, JsonRpcRequest, McpError, SessionError, ToolDescriptor, TransportError,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Default time to wait for a response to a session call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Protocol version offered during the handshake unless overridden.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

/// Parameters of the `initialize` handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeOptions {
    pub client_name: String,
    pub client_version: String,
    pub protocol_version: String,
    pub capabilities: Value,
}

impl Default for InitializeOptions {
    fn default() -> Self {
        Self {
            client_name: "mcpager".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
        }
    }
}

impl InitializeOptions {
    fn params(&self) -> Value {
        json!({
            "clientInfo": {
                "name": self.client_name,
                "version": self.client_version,
            },
            "capabilities": self.capabilities,
            "protocolVersion": self.protocol_version,
        })
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initialized,
    Closed,
}

#[derive(Debug, Default)]
struct Handshake {
    capabilities: Map<String, Value>,
    initialized: bool,
    session_id: Option<String>,
}

struct Exchange {
    transport: Box<dyn Transport>,
    ids: RequestIds,
}

/// An MCP client session over one exclusively owned transport.
pub struct Session {
    exchange: Mutex<Exchange>,
    handshake: RwLock<Handshake>,
    closed: CancellationToken,
    timeout: Duration,
}

impl Session {
    /// Create a session that owns `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    /// Create a session over an already-boxed transport.
    pub fn from_boxed(transport: Box<dyn Transport>) -> Self {
        Self {
            exchange: Mutex::new(Exchange {
                transport,
                ids: RequestIds::new(),
            }),
            handshake: RwLock::new(Handshake::default()),
            closed: CancellationToken::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Spawn `command` and talk to it over its stdin/stdout.
    pub fn from_command(command: &str, args: &[String]) -> Result<Self, McpError> {
        let transport = StdioTransport::spawn(command, args, &HashMap::new())?;
        Ok(Self::new(transport))
    }

    /// Talk to the MCP endpoint at `url` over HTTP.
    pub fn over_http(url: impl Into<String>) -> Result<Self, McpError> {
        Ok(Self::new(HttpTransport::new(url)?))
    }

    /// Set the default timeout for session calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform the `initialize` handshake, replacing any earlier handshake state.
    ///
    /// Returns the server's raw result.
    pub async fn initialize(&self, options: InitializeOptions) -> Result<Value, McpError> {
        let result = self.send_request("initialize", Some(options.params())).await?;

        let capabilities = result
            .get("capabilities")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string);

        {
            let mut handshake = self
                .handshake
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            handshake.capabilities = capabilities;
            handshake.session_id = session_id;
            handshake.initialized = true;
        }

        tracing::info!(
            "MCP session initialized (protocol {}, client {} {})",
            options.protocol_version,
            options.client_name,
            options.client_version
        );
        Ok(result)
    }

    /// Retrieve the server's tools, in the order the server listed them.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        if !self.is_initialized() {
            return Err(SessionError::NotInitialized.into());
        }

        let result = self.send_request("tools/list", None).await?;
        let tools = match result.get("tools") {
            None | Some(Value::Null) => Vec::new(),
            Some(tools) => serde_json::from_value(tools.clone()).map_err(|e| {
                TransportError::Protocol(format!("Failed to parse tools/list response: {e}"))
            })?,
        };

        tracing::debug!("Discovered {} tools", tools.len());
        Ok(tools)
    }

    /// Send a request and wait for its result using the session timeout.
    pub async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        self.send_request_with_timeout(method, params, self.timeout)
            .await
    }

    /// Send a request and wait up to `timeout` for its result.
    ///
    /// Concurrent callers queue on the exchange lock; `close` unblocks both
    /// queued and in-flight callers with `ConnectionClosed`.
    pub async fn send_request_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, McpError> {
        let mut exchange = tokio::select! {
            guard = self.exchange.lock() => guard,
            _ = self.closed.cancelled() => return Err(TransportError::ConnectionClosed.into()),
        };
        if self.closed.is_cancelled() {
            return Err(TransportError::ConnectionClosed.into());
        }

        let Exchange { transport, ids } = &mut *exchange;
        let request = JsonRpcRequest::new(ids.next_id(), method, params);
        tracing::debug!("-> {} {} via {}", request.method, request.id, transport.name());

        let outcome: Result<Value, McpError> = tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(TransportError::ConnectionClosed.into()),
            outcome = correlate(transport.as_mut(), &request, timeout) => outcome,
        };

        match &outcome {
            Ok(_) => tracing::debug!("<- {} {} ok", request.method, request.id),
            Err(e) => tracing::debug!("<- {} {} failed: {e}", request.method, request.id),
        }
        outcome
    }

    /// Close the transport. Best-effort and idempotent.
    pub async fn close(&self) {
        self.closed.cancel();
        let mut exchange = self.exchange.lock().await;
        exchange.transport.close().await;
        tracing::info!("MCP session closed");
    }

    pub fn is_initialized(&self) -> bool {
        self.handshake
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .initialized
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub fn state(&self) -> SessionState {
        if self.is_closed() {
            SessionState::Closed
        } else if self.is_initialized() {
            SessionState::Initialized
        } else {
            SessionState::Created
        }
    }

    /// Capabilities advertised by the server during the last handshake.
    pub fn capabilities(&self) -> Map<String, Value> {
        self.handshake
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .capabilities
            .clone()
    }

    /// Server-assigned session id from the last handshake, if any.
    pub fn session_id(&self) -> Option<String> {
        self.handshake
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session_id
            .clone()
    }
}

/// Send one request and interpret whatever the transport hands back.
async fn correlate(
    transport: &mut dyn Transport,
    request: &JsonRpcRequest,
    timeout: Duration,
) -> Result<Value, McpError> {
    transport.send(request).await?;
    match transport.receive(timeout).await? {
        Received::Message(value) => settle_message(value, &request.id),
        Received::Events(events) => settle_stream(events, &request.id, timeout).await,
    }
}

fn settle_message(value: Value, id: &str) -> Result<Value, McpError> {
    if !value.is_object() {
        return Err(TransportError::Protocol(format!("Unexpected response shape: {value}")).into());
    }
    let message = JsonRpcMessage::from_value(value).ok_or_else(|| {
        TransportError::Protocol("Response is not a JSON-RPC message".to_string())
    })?;

    if !message.answers(id) {
        return Err(SessionError::UnexpectedId {
            expected: id.to_string(),
            actual: message.id_display(),
        }
        .into());
    }

    message
        .into_outcome()
        .map_err(|error| SessionError::Server(error).into())
}

/// Drain a streamed exchange. `idle` bounds the wait for each next event.
async fn settle_stream(
    mut events: EventStream,
    id: &str,
    idle: Duration,
) -> Result<Value, McpError> {
    loop {
        let event = match tokio::time::timeout(idle, events.next()).await {
            Ok(Some(event)) => event?,
            Ok(None) => break,
            Err(_) => {
                tracing::debug!("Event stream for {id} went quiet for {idle:?}");
                return Err(TransportError::Timeout {
                    timeout_ms: u64::try_from(idle.as_millis()).unwrap_or(u64::MAX),
                }
                .into());
            }
        };
        let Some(message) = JsonRpcMessage::from_value(event) else {
            continue;
        };

        if message.is_progress() {
            tracing::debug!("Progress for {id}: {:?}", message.params);
            continue;
        }

        if message.answers(id) {
            return message
                .into_outcome()
                .map_err(|error| SessionError::Server(error).into());
        }

        tracing::debug!(
            "Ignoring streamed event with id {} while waiting for {id}",
            message.id_display()
        );
    }

    Err(SessionError::NoFinalResult { id: id.to_string() }.into())
}
