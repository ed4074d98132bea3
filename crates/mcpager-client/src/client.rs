//! McpClient pairs a backend with the session it operates on.

use crate::backend::{Backend, ToolBackend};
use mcpager_session::Session;
use mcpager_types::{McpError, ToolCallOutput};
use serde_json::Value;
use std::sync::Arc;

/// Forwards every call to its backend, passing the session along.
pub struct McpClient<B: Backend = ToolBackend> {
    backend: B,
    session: Arc<Session>,
}

impl McpClient<ToolBackend> {
    /// Client over `session` with the default [`ToolBackend`].
    pub fn from_session(session: Session) -> Self {
        Self::new(ToolBackend::new(), Arc::new(session))
    }
}

impl<B: Backend> McpClient<B> {
    pub fn new(backend: B, session: Arc<Session>) -> Self {
        Self { backend, session }
    }

    pub async fn initialize(&self) -> Result<Value, McpError> {
        self.backend.initialize(&self.session).await
    }

    pub async fn list_tools(&self) -> Result<Vec<B::Tool>, McpError> {
        self.backend.list_tools(&self.session).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallOutput, McpError> {
        self.backend.call_tool(&self.session, name, arguments).await
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn close(&self) {
        self.session.close().await;
    }
}
