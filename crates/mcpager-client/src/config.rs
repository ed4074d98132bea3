//! Configuration types for MCP servers.

use mcpager_session::Session;
use mcpager_transport::{HttpTransport, StdioTransport};
use mcpager_types::{ConfigError, McpError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

fn default_timeout() -> u64 {
    10000
}

fn default_grace() -> u64 {
    2000
}

/// Top-level MCP configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: HashMap<String, ServerConfig>,
}

impl McpConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, "<string>")
    }

    fn parse(contents: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Look up a server by name.
    pub fn server(&self, name: &str) -> Result<&ServerConfig, ConfigError> {
        self.servers.get(name).ok_or_else(|| ConfigError::UnknownServer {
            name: name.to_string(),
        })
    }
}

/// How to reach a server: a local command or an HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportConfig {
    Stdio {
        /// Command to run (e.g., "npx", "python").
        command: String,
        #[serde(default)]
        args: Vec<String>,
        /// Environment variables to set for the server process.
        #[serde(default)]
        env: HashMap<String, String>,
    },
    Http {
        url: String,
        /// Extra headers sent with every request.
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

/// Configuration for a single MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub transport: TransportConfig,
    /// Timeout for requests in milliseconds (default: 10000).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// Time a stdio server gets to exit on close before it is killed (default: 2000).
    #[serde(default = "default_grace")]
    pub shutdown_grace_ms: u64,
}

impl ServerConfig {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::with_transport(TransportConfig::Stdio {
            command: command.into(),
            args,
            env: HashMap::new(),
        })
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::with_transport(TransportConfig::Http {
            url: url.into(),
            headers: HashMap::new(),
        })
    }

    fn with_transport(transport: TransportConfig) -> Self {
        Self {
            transport,
            timeout_ms: default_timeout(),
            shutdown_grace_ms: default_grace(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build the configured transport and wrap it in a session.
    pub fn connect(&self) -> Result<Session, McpError> {
        let session = match &self.transport {
            TransportConfig::Stdio { command, args, env } => {
                tracing::info!("Starting MCP server: {command} {}", args.join(" "));
                let transport = StdioTransport::spawn(command, args, env)?
                    .with_grace_period(Duration::from_millis(self.shutdown_grace_ms));
                Session::new(transport)
            }
            TransportConfig::Http { url, headers } => {
                tracing::info!("Connecting to MCP endpoint {url}");
                Session::new(HttpTransport::new(url.as_str())?.with_headers(headers)?)
            }
        };
        Ok(session.with_timeout(self.timeout()))
    }
}
