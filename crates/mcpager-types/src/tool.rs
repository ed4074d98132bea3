//! Tool descriptors and the framework-facing tool trait.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Server-supplied metadata describing one remotely invocable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(
        default,
        rename = "inputSchema",
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    /// Descriptor with just a name, as some servers send them.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: None,
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Result of a `tools/call` as seen by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutput {
    /// Best-effort readable projection of the result.
    pub content: Value,
    /// The raw result, unchanged.
    pub artifact: Value,
}

/// A remote tool exposed in the host application's idiom.
pub trait Tool: Send + Sync {
    /// The tool name as advertised by the server.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments accepted by [`Tool::invoke`].
    fn input_schema(&self) -> Value;

    /// Invoke the tool with a JSON object of arguments.
    fn invoke(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolCallOutput, crate::error::ToolError>> + Send + '_>>;
}
