//! Subcommand handlers.

use crate::Command;
use anyhow::{Context, Result, anyhow};
use mcpager_client::McpClient;
use mcpager_types::Tool;
use serde_json::Value;

pub async fn run(client: &McpClient, command: Command) -> Result<()> {
    let handshake = client
        .initialize()
        .await
        .context("MCP handshake failed")?;

    match command {
        Command::Init => print_json(&handshake),
        Command::Tools => {
            let tools = client.list_tools().await.context("tools/list failed")?;
            if tools.is_empty() {
                eprintln!("Server exposes no tools.");
            }
            for tool in &tools {
                if tool.description().is_empty() {
                    println!("{}", tool.name());
                } else {
                    println!("{:<24} {}", tool.name(), tool.description());
                }
            }
            Ok(())
        }
        Command::Call { name, args, raw } => {
            let arguments: Value =
                serde_json::from_str(&args).context("--args must be valid JSON")?;

            let tools = client.list_tools().await.context("tools/list failed")?;
            let tool = tools
                .iter()
                .find(|t| t.name() == name)
                .ok_or_else(|| anyhow!("Server has no tool named '{name}'"))?;

            let output = tool.invoke(arguments).await?;
            if raw {
                print_json(&output.artifact)
            } else {
                print_content(&output.content)
            }
        }
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Text blocks are printed as plain text; anything else as JSON.
fn print_content(content: &Value) -> Result<()> {
    match content {
        Value::String(text) => println!("{text}"),
        Value::Array(blocks) if blocks.iter().all(is_text_block) => {
            for block in blocks {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    println!("{text}");
                }
            }
        }
        other => return print_json(other),
    }
    Ok(())
}

fn is_text_block(block: &Value) -> bool {
    block.get("type").and_then(Value::as_str) == Some("text")
}
