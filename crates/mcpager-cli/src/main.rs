//! mcpager CLI: talk to an MCP server from the terminal.

mod commands;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mcpager_client::{McpClient, McpConfig, ServerConfig};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcpager", version, about = "Inspect and call tools on MCP servers")]
struct Cli {
    /// TOML file with [servers.<name>] entries
    #[arg(long, requires = "server")]
    config: Option<PathBuf>,

    /// Server name to use from --config
    #[arg(long, requires = "config")]
    server: Option<String>,

    /// Spawn a local server, e.g. --stdio "python echo_server.py"
    #[arg(long, conflicts_with_all = ["config", "url"])]
    stdio: Option<String>,

    /// URL of a remote server's MCP endpoint
    #[arg(long, conflicts_with = "config")]
    url: Option<String>,

    /// Request timeout in milliseconds (overrides the config file)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Perform the handshake and print the server's reply
    Init,
    /// List the server's tools
    Tools,
    /// Call a tool
    Call {
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        /// Print the raw result instead of its content
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let server = resolve_server(&cli)?;
    tracing::debug!("Server: {:?}", server.transport);
    let session = server
        .connect()
        .context("Failed to connect to MCP server")?;
    let client = McpClient::from_session(session);

    let outcome = commands::run(&client, cli.command).await;
    client.close().await;
    outcome
}

/// Work out which server the flags point at.
fn resolve_server(cli: &Cli) -> Result<ServerConfig> {
    let mut server = match (&cli.config, &cli.server, &cli.stdio, &cli.url) {
        (Some(path), Some(name), None, None) => {
            let config = McpConfig::load(path)?;
            config.server(name)?.clone()
        }
        (None, None, Some(command_line), None) => {
            let mut words = command_line.split_whitespace().map(str::to_string);
            let Some(command) = words.next() else {
                bail!("--stdio needs a command");
            };
            ServerConfig::stdio(command, words.collect())
        }
        (None, None, None, Some(url)) => ServerConfig::http(url.as_str()),
        _ => bail!("Choose one server: --config with --server, --stdio, or --url"),
    };

    if let Some(timeout_ms) = cli.timeout_ms {
        server.timeout_ms = timeout_ms;
    }
    Ok(server)
}
