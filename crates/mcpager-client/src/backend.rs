//! Backend adapters: how tool descriptors and call results reach the host.

use crate::tool::RemoteTool;
use mcpager_session::{InitializeOptions, Session};
use mcpager_transport::BoxFuture;
use mcpager_types::{McpError, ToolCallOutput};
use serde_json::{Value, json};
use std::sync::Arc;

/// Turns a session's raw protocol results into the host application's shapes.
///
/// Every method receives the session it operates on; a backend holds no
/// connection state of its own.
pub trait Backend: Send + Sync {
    /// The callable object produced for each discovered tool.
    type Tool: Send;

    fn initialize<'a>(&'a self, session: &'a Arc<Session>) -> BoxFuture<'a, Result<Value, McpError>>;

    fn list_tools<'a>(
        &'a self,
        session: &'a Arc<Session>,
    ) -> BoxFuture<'a, Result<Vec<Self::Tool>, McpError>>;

    fn call_tool<'a>(
        &'a self,
        session: &'a Arc<Session>,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, Result<ToolCallOutput, McpError>>;
}

/// Default backend: exposes each remote tool as a [`RemoteTool`].
#[derive(Debug, Clone, Default)]
pub struct ToolBackend {
    options: InitializeOptions,
}

impl ToolBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom handshake parameters instead of the defaults.
    pub fn with_options(options: InitializeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InitializeOptions {
        &self.options
    }
}

impl Backend for ToolBackend {
    type Tool = RemoteTool;

    fn initialize<'a>(&'a self, session: &'a Arc<Session>) -> BoxFuture<'a, Result<Value, McpError>> {
        Box::pin(session.initialize(self.options.clone()))
    }

    fn list_tools<'a>(
        &'a self,
        session: &'a Arc<Session>,
    ) -> BoxFuture<'a, Result<Vec<RemoteTool>, McpError>> {
        Box::pin(async move {
            let descriptors = session.list_tools().await?;
            Ok(descriptors
                .into_iter()
                .map(|descriptor| RemoteTool::new(descriptor, Arc::clone(session)))
                .collect())
        })
    }

    fn call_tool<'a>(
        &'a self,
        session: &'a Arc<Session>,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, Result<ToolCallOutput, McpError>> {
        Box::pin(call_remote(session, name, arguments))
    }
}

/// Issue `tools/call` and split the result into content and artifact.
pub(crate) async fn call_remote(
    session: &Session,
    name: &str,
    arguments: Value,
) -> Result<ToolCallOutput, McpError> {
    tracing::debug!("Calling tool '{name}'");
    let result = session
        .send_request("tools/call", Some(json!({"name": name, "arguments": arguments})))
        .await?;

    Ok(ToolCallOutput {
        content: project_content(&result),
        artifact: result,
    })
}

/// Readable projection of a `tools/call` result.
///
/// Takes `content` if it is non-empty, else `result` if non-empty, else the
/// whole result rendered as a JSON string.
pub fn project_content(result: &Value) -> Value {
    ["content", "result"]
        .iter()
        .filter_map(|key| result.get(key))
        .find(|value| is_truthy(value))
        .cloned()
        .unwrap_or_else(|| Value::String(result.to_string()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
