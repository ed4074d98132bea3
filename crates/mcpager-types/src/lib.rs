//! Shared types and error hierarchy for mcpager.

pub mod error;
pub mod jsonrpc;
pub mod tool;

pub use error::{ConfigError, McpError, SessionError, ToolError, TransportError};
pub use jsonrpc::{JSONRPC_VERSION, JsonRpcMessage, JsonRpcRequest};
pub use tool::*;
