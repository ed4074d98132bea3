//! JSON-RPC 2.0 envelopes exchanged with MCP servers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version written on every outgoing envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request with a string correlation id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    /// Create a new request. Missing params are sent as an empty object.
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: id.into(),
            method: method.into(),
            params: params.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

/// Any message a server may send back: a response, an error response or a
/// notification such as a progress event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl JsonRpcMessage {
    /// Decode a message from an already-parsed JSON value. Only objects qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Whether this is a non-terminal progress notification.
    pub fn is_progress(&self) -> bool {
        matches!(
            self.method.as_deref(),
            Some("progress" | "notifications/progress")
        )
    }

    /// Whether this message answers the request with the given id.
    pub fn answers(&self, id: &str) -> bool {
        matches!(&self.id, Some(Value::String(s)) if s == id)
    }

    /// The message id rendered for diagnostics (`null` when absent).
    pub fn id_display(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "null".to_string(),
        }
    }

    /// Split into the server's error payload or the result (empty object if absent).
    pub fn into_outcome(self) -> Result<Value, Value> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self
                .result
                .unwrap_or_else(|| Value::Object(Default::default()))),
        }
    }
}
