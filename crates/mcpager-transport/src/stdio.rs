//! Stdio transport for MCP server communication.
//!
//! Spawns a child process and exchanges newline-delimited JSON-RPC messages
//! over its stdin/stdout. Stderr is drained into the log, never parsed.

use crate::transport::{BoxFuture, Received, Transport, timeout_ms};
use mcpager_types::{JsonRpcRequest, TransportError};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long `close` waits for the child to exit before killing it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Stdio transport over an owned child process.
pub struct StdioTransport {
    command: String,
    process: Option<Process>,
    /// Bytes of a line not yet terminated by `\n`. Kept across timeouts so a
    /// slow line is resumed by the next `receive` instead of lost.
    line: Vec<u8>,
    grace_period: Duration,
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr_task: JoinHandle<()>,
}

impl StdioTransport {
    /// Spawn `command` with `args` and start draining its stderr.
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Self, TransportError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| TransportError::Spawn {
            command: command.to_string(),
            source: e,
        })?;

        let missing = |stream: &str| TransportError::Io(format!("child {stream} was not piped"));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let name = command.to_string();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!("[{name} stderr] {line}");
            }
        });

        tracing::info!("Spawned MCP server process '{command}' (pid {:?})", child.id());

        Ok(Self {
            command: command.to_string(),
            process: Some(Process {
                child,
                stdin,
                stdout: BufReader::new(stdout),
                stderr_task,
            }),
            line: Vec::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        })
    }

    /// Set how long `close` waits before force-killing the child.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// The command this transport was spawned from.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether `close` has already run.
    pub fn is_closed(&self) -> bool {
        self.process.is_none()
    }

    async fn write_line(&mut self, message: &JsonRpcRequest) -> Result<(), TransportError> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| TransportError::Io("transport is closed".to_string()))?;

        let mut line = serde_json::to_vec(message)
            .map_err(|e| TransportError::Protocol(format!("Failed to serialize request: {e}")))?;
        line.push(b'\n');

        process.stdin.write_all(&line).await?;
        process.stdin.flush().await?;
        tracing::debug!("-> {}: {} ({})", self.command, message.method, message.id);
        Ok(())
    }

    async fn read_message(&mut self, timeout: Duration) -> Result<Received, TransportError> {
        let deadline = Instant::now() + timeout;
        let process = self
            .process
            .as_mut()
            .ok_or(TransportError::ConnectionClosed)?;

        loop {
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout {
                    timeout_ms: timeout_ms(timeout),
                });
            }

            let byte = match tokio::time::timeout_at(deadline, process.stdout.read_u8()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(TransportError::Timeout {
                        timeout_ms: timeout_ms(timeout),
                    });
                }
            };

            if byte != b'\n' {
                self.line.push(byte);
                continue;
            }

            let raw = std::mem::take(&mut self.line);
            let text = String::from_utf8(raw)
                .map_err(|e| TransportError::Protocol(format!("Invalid UTF-8 line: {e}")))?;
            let line = text.trim();
            if line.is_empty() {
                continue;
            }

            tracing::debug!("<- {}: {line}", self.command);
            return serde_json::from_str(line)
                .map(Received::Message)
                .map_err(|e| TransportError::Protocol(format!("Invalid JSON line {line:?}: {e}")));
        }
    }

    async fn shutdown(&mut self) {
        let Some(process) = self.process.take() else {
            return;
        };
        self.line.clear();

        let Process {
            mut child,
            stdin,
            stdout,
            stderr_task,
        } = process;

        // Closing stdin is the graceful termination request.
        drop(stdin);
        drop(stdout);

        match tokio::time::timeout(self.grace_period, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!("MCP server '{}' exited with {status}", self.command);
            }
            Ok(Err(e)) => {
                tracing::debug!("Failed to wait on MCP server '{}': {e}", self.command);
            }
            Err(_) => {
                tracing::warn!(
                    "MCP server '{}' did not exit within {:?}; killing it",
                    self.command,
                    self.grace_period
                );
                if let Err(e) = child.kill().await {
                    tracing::debug!("Failed to kill MCP server '{}': {e}", self.command);
                }
            }
        }

        stderr_task.abort();
    }
}

impl Transport for StdioTransport {
    fn send<'a>(&'a mut self, message: &'a JsonRpcRequest) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(self.write_line(message))
    }

    fn receive(&mut self, timeout: Duration) -> BoxFuture<'_, Result<Received, TransportError>> {
        Box::pin(self.read_message(timeout))
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(self.shutdown())
    }

    fn name(&self) -> &str {
        "stdio"
    }
}
