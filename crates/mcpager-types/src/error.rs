//! Error hierarchy for mcpager.

use thiserror::Error;

/// Errors raised by a transport while moving messages over its channel.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Timed out after {timeout_ms}ms waiting for a message")]
    Timeout { timeout_ms: u64 },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            _ => TransportError::Io(e.to_string()),
        }
    }
}

/// Protocol-level failures detected by the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not initialized. Call initialize() first.")]
    NotInitialized,

    #[error("Unexpected response id: {actual} (expected {expected})")]
    UnexpectedId { expected: String, actual: String },

    /// The server answered with an `error` payload, kept verbatim.
    #[error("Server error: {0}")]
    Server(serde_json::Value),

    #[error("No final result for request {id}")]
    NoFinalResult { id: String },
}

/// Top-level error for session, backend and client operations.
#[derive(Debug, Error)]
pub enum McpError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl McpError {
    /// Whether the exchange failed because no response arrived in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, McpError::Transport(TransportError::Timeout { .. }))
    }

    /// Whether the underlying channel is closed or broken.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            McpError::Transport(TransportError::ConnectionClosed | TransportError::Io(_))
        )
    }

    /// The server's `error` payload, if this is a server-returned error.
    pub fn server_error(&self) -> Option<&serde_json::Value> {
        match self {
            McpError::Session(SessionError::Server(payload)) => Some(payload),
            _ => None,
        }
    }
}

/// Errors from invoking a remote tool through its framework-facing wrapper.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },

    #[error("Tool call failed: {0}")]
    Call(#[from] McpError),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("No server named '{name}' in configuration")]
    UnknownServer { name: String },
}
