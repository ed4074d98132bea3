//! Client-side plumbing on top of an MCP [`Session`](mcpager_session::Session).
//!
//! A [`Backend`] turns raw tool descriptors and `tools/call` results into the
//! host application's shapes; [`McpClient`] pairs one backend with one session.
//! [`McpConfig`] describes how to reach configured servers.

mod backend;
mod client;
mod config;
mod tool;

pub use backend::{Backend, ToolBackend, project_content};
pub use client::McpClient;
pub use config::{McpConfig, ServerConfig, TransportConfig};
pub use tool::{ArgKind, ArgSpec, ArgsSchema, RemoteTool};
