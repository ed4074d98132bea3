//! MCP protocol session for mcpager.
//!
//! A [`Session`] owns one transport and serializes every exchange on it:
//! it generates request ids, correlates responses, performs the `initialize`
//! handshake and discovers tools via `tools/list`.

mod id;
mod session;

pub use id::RequestIds;
pub use session::{
    DEFAULT_PROTOCOL_VERSION, DEFAULT_TIMEOUT, InitializeOptions, Session, SessionState,
};
