//! HTTP transport with optional server-sent event streaming.
//!
//! `send` only stores the outgoing request; `receive` performs the POST and
//! branches on the response content type.

use crate::stream::SseEventStream;
use crate::transport::{BoxFuture, Received, Transport, timeout_ms};
use mcpager_types::{JsonRpcRequest, TransportError};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Response header carrying the server-assigned session identifier.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

const EVENT_STREAM: &str = "text/event-stream";

/// HTTP transport for a single MCP endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
    headers: HeaderMap,
    pending: Option<JsonRpcRequest>,
    closed: bool,
}

impl HttpTransport {
    /// Create a transport that POSTs to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let url = url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http,
            url,
            headers,
            pending: None,
            closed: false,
        })
    }

    /// Add static headers (e.g. `Authorization`) sent with every request.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Result<Self, TransportError> {
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Io(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Io(format!("Invalid value for header '{name}': {e}")))?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    /// The endpoint URL, without a trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The session identifier captured from the server, once observed.
    pub fn session_id(&self) -> Option<&str> {
        self.headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    /// Remember the first session id the server hands out.
    fn capture_session_id(&mut self, response_headers: &HeaderMap) {
        if self.headers.contains_key(SESSION_ID_HEADER) {
            return;
        }
        if let Some(value) = response_headers.get(SESSION_ID_HEADER) {
            tracing::debug!("Captured MCP session id from {}", self.url);
            self.headers
                .insert(HeaderName::from_static(SESSION_ID_HEADER), value.clone());
        }
    }

    async fn exchange(&mut self, timeout: Duration) -> Result<Received, TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        let request = self.pending.take().ok_or_else(|| {
            TransportError::Io("No message to send. Call send() first.".to_string())
        })?;

        let deadline = Instant::now() + timeout;
        let timed_out = || TransportError::Timeout {
            timeout_ms: timeout_ms(timeout),
        };

        tracing::debug!("POST {} ({} {})", self.url, request.method, request.id);

        let send = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .header(ACCEPT, format!("application/json, {EVENT_STREAM}"))
            .json(&request)
            .send();

        let response = match tokio::time::timeout_at(deadline, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => return Err(timed_out()),
            Ok(Err(e)) => return Err(TransportError::Io(format!("HTTP request failed: {e}"))),
            Err(_) => return Err(timed_out()),
        };

        self.capture_session_id(response.headers());

        let status = response.status();
        if !status.is_success() {
            let body = match tokio::time::timeout_at(deadline, response.text()).await {
                Ok(body) => body.unwrap_or_default(),
                Err(_) => return Err(timed_out()),
            };
            return Err(TransportError::Io(format!("HTTP error {status}: {body}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains(EVENT_STREAM) {
            tracing::debug!("Streaming response for {}", request.id);
            return Ok(Received::Events(Box::pin(SseEventStream::new(
                response.bytes_stream(),
            ))));
        }

        let body = match tokio::time::timeout_at(deadline, response.bytes()).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => return Err(TransportError::Io(format!("Failed to read body: {e}"))),
            Err(_) => return Err(timed_out()),
        };

        let message: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            TransportError::Protocol(format!(
                "Invalid JSON response: {e}: {}",
                String::from_utf8_lossy(&body)
            ))
        })?;
        if !message.is_object() {
            return Err(TransportError::Protocol(format!(
                "Unexpected response shape: {message}"
            )));
        }

        Ok(Received::Message(message))
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a mut self, message: &'a JsonRpcRequest) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            if self.closed {
                return Err(TransportError::Io("transport is closed".to_string()));
            }
            if let Some(previous) = self.pending.replace(message.clone()) {
                tracing::warn!(
                    "Replacing unsent request {} with {}",
                    previous.id,
                    message.id
                );
            }
            Ok(())
        })
    }

    fn receive(&mut self, timeout: Duration) -> BoxFuture<'_, Result<Received, TransportError>> {
        Box::pin(self.exchange(timeout))
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closed = true;
            self.pending = None;
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
