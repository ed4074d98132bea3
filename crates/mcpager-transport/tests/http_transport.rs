//! Integration tests for HttpTransport against a mock MCP endpoint.
//!
//! Covers plain JSON responses, event-stream responses, session-id capture
//! and HTTP-level failures.

use futures_util::StreamExt;
use mcpager_transport::{HttpTransport, Received, SESSION_ID_HEADER, Transport};
use mcpager_types::{JsonRpcRequest, TransportError};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn exchange(transport: &mut HttpTransport, id: &str) -> Result<Received, TransportError> {
    let request = JsonRpcRequest::new(id, "tools/list", None);
    transport.send(&request).await?;
    transport.receive(TIMEOUT).await
}

async fn collect(received: Received) -> Vec<Value> {
    match received {
        Received::Events(mut stream) => {
            let mut events = Vec::new();
            while let Some(event) = stream.next().await {
                events.push(event.expect("event should decode"));
            }
            events
        }
        Received::Message(value) => panic!("Expected event stream, got message {value}"),
    }
}

// ---------------------------------------------------------------------------
// Plain JSON
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(header("content-type", "application/json"))
        .and(|request: &wiremock::Request| {
            request
                .headers
                .get("accept")
                .and_then(|v| v.to_str().ok())
                == Some("application/json, text/event-stream")
        })
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"jsonrpc":"2.0","id":"1","result":{"ok":true}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(format!("{}/mcp", server.uri())).unwrap();
    match exchange(&mut transport, "1").await.unwrap() {
        Received::Message(message) => {
            assert_eq!(message["id"], "1");
            assert_eq!(message["result"], json!({"ok": true}));
        }
        Received::Events(_) => panic!("Expected a single message"),
    }
}

#[tokio::test]
async fn test_request_body_is_jsonrpc_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "jsonrpc": "2.0",
            "id": "req-9",
            "method": "tools/list",
            "params": {}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"jsonrpc":"2.0","id":"req-9","result":{}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    assert!(exchange(&mut transport, "req-9").await.is_ok());
}

#[tokio::test]
async fn test_invalid_json_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("not json", "application/json"),
        )
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    let err = exchange(&mut transport, "1").await.unwrap_err();
    assert!(matches!(err, TransportError::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn test_non_object_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("[1, 2, 3]", "application/json"),
        )
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    let err = exchange(&mut transport, "1").await.unwrap_err();
    assert!(matches!(err, TransportError::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    match exchange(&mut transport, "1").await.unwrap_err() {
        TransportError::Io(message) => {
            assert!(message.contains("500"), "message={message}");
            assert!(message.contains("boom"), "message={message}");
        }
        other => panic!("Expected Io, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"id":"1","result":{}}"#, "application/json")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    let request = JsonRpcRequest::new("1", "tools/list", None);
    transport.send(&request).await.unwrap();
    let err = transport
        .receive(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout { timeout_ms: 200 }), "got {err:?}");
}

/// Peer that sends a 500 status line and part of its body, then stalls.
async fn stalling_error_body() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let response = "HTTP/1.1 500 Internal Server Error\r\n\
Content-Type: text/plain\r\n\
Content-Length: 100\r\n\
\r\n\
partial";
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_stalled_error_body_times_out() {
    let mut transport = HttpTransport::new(stalling_error_body().await).unwrap();
    let request = JsonRpcRequest::new("1", "tools/list", None);
    transport.send(&request).await.unwrap();

    let err = tokio::time::timeout(Duration::from_secs(3), transport.receive(Duration::from_millis(300)))
        .await
        .expect("error body read must respect the receive timeout")
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout { timeout_ms: 300 }), "got {err:?}");
}

#[tokio::test]
async fn test_second_receive_without_send_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"id":"1","result":{}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    exchange(&mut transport, "1").await.unwrap();
    let err = transport.receive(TIMEOUT).await.unwrap_err();
    assert!(matches!(err, TransportError::Io(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Event streams
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_event_stream_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"id\":\"1\",\"result\":{\"ok\":true}}\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    let events = collect(exchange(&mut transport, "1").await.unwrap()).await;
    assert_eq!(events, vec![json!({"id": "1", "result": {"ok": true}})]);
}

#[tokio::test]
async fn test_event_stream_skips_malformed_lines() {
    let body = "\
event: message\n\
data: {\"jsonrpc\":\"2.0\",\"method\":\"progress\",\"params\":{\"pct\":50}}\n\
\n\
data: {not valid json\n\
\n\
: keepalive\n\
data: {\"jsonrpc\":\"2.0\",\"id\":\"7\",\"result\":{\"value\":42}}\n\
\n";

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/event-stream; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    let events = collect(exchange(&mut transport, "7").await.unwrap()).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["method"], "progress");
    assert_eq!(events[1]["result"]["value"], 42);
}

// ---------------------------------------------------------------------------
// Session id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_session_id_is_captured_and_echoed() {
    let server = MockServer::start().await;

    // Requests carrying the session id get a distinguishable answer.
    Mock::given(method("POST"))
        .and(header(SESSION_ID_HEADER, "abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"id":"2","result":{"echoed":true}}"#, "application/json"),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(SESSION_ID_HEADER, "abc")
                .set_body_raw(r#"{"id":"1","result":{}}"#, "application/json"),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::new(server.uri()).unwrap();
    assert!(transport.session_id().is_none());

    exchange(&mut transport, "1").await.unwrap();
    assert_eq!(transport.session_id(), Some("abc"));

    match exchange(&mut transport, "2").await.unwrap() {
        Received::Message(message) => assert_eq!(message["result"]["echoed"], true),
        Received::Events(_) => panic!("Expected a single message"),
    }
}
