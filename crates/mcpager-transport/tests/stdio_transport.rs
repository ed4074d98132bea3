//! Integration tests for StdioTransport against real child processes.

use mcpager_transport::{Received, StdioTransport, Transport};
use mcpager_types::{JsonRpcRequest, TransportError};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};

fn spawn(command: &str, args: &[&str]) -> StdioTransport {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    StdioTransport::spawn(command, &args, &HashMap::new()).expect("command should spawn")
}

#[tokio::test]
async fn echo_peer_returns_sent_line() {
    // `cat` echoes every line back verbatim.
    let mut transport = spawn("cat", &[]);
    let request = JsonRpcRequest::new("req-1", "echo", Some(json!({"a": 1})));
    transport.send(&request).await.unwrap();

    match transport.receive(Duration::from_secs(5)).await.unwrap() {
        Received::Message(value) => {
            assert_eq!(value, serde_json::to_value(&request).unwrap());
        }
        Received::Events(_) => panic!("stdio never streams"),
    }

    transport.close().await;
}

#[tokio::test]
async fn messages_arrive_in_order() {
    let mut transport = spawn("cat", &[]);
    for id in ["a", "b", "c"] {
        transport
            .send(&JsonRpcRequest::new(id, "ping", None))
            .await
            .unwrap();
    }
    for id in ["a", "b", "c"] {
        match transport.receive(Duration::from_secs(5)).await.unwrap() {
            Received::Message(value) => assert_eq!(value["id"], id),
            Received::Events(_) => panic!("stdio never streams"),
        }
    }
    transport.close().await;
}

#[tokio::test]
async fn silent_peer_times_out_promptly() {
    // `sleep` never writes to stdout.
    let mut transport = spawn("sleep", &["10"]);
    let timeout = Duration::from_millis(200);

    let started = Instant::now();
    let err = transport.receive(timeout).await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        TransportError::Timeout { timeout_ms } => assert_eq!(timeout_ms, 200),
        other => panic!("Expected Timeout, got {other:?}"),
    }
    assert!(elapsed >= timeout, "returned early: {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_secs(1), "took {elapsed:?}");

    transport.close().await;
}

#[tokio::test]
async fn close_twice_is_a_noop() {
    let mut transport = spawn("cat", &[]);
    transport.close().await;
    transport.close().await;
    assert!(transport.is_closed());
}

#[tokio::test]
async fn write_to_exited_process_fails() {
    let mut transport = spawn("sh", &["-c", "exit 0"]);
    // Wait for the child to go away so the pipe is broken.
    let _ = transport.receive(Duration::from_secs(5)).await;

    let request = JsonRpcRequest::new("1", "ping", Some(json!({"padding": "x".repeat(1 << 17)})));
    let err = transport.send(&request).await.unwrap_err();
    assert!(matches!(err, TransportError::Io(_)), "got {err:?}");

    transport.close().await;
}

#[tokio::test]
async fn child_environment_is_passed_through() {
    let mut env = HashMap::new();
    env.insert("MCPAGER_TEST_VALUE".to_string(), "forty-two".to_string());
    let mut transport = StdioTransport::spawn(
        "sh",
        &[
            "-c".to_string(),
            r#"printf '{"value":"%s"}\n' "$MCPAGER_TEST_VALUE"; sleep 5"#.to_string(),
        ],
        &env,
    )
    .unwrap();

    match transport.receive(Duration::from_secs(5)).await.unwrap() {
        Received::Message(value) => assert_eq!(value["value"], "forty-two"),
        Received::Events(_) => panic!("stdio never streams"),
    }
    transport.close().await;
}
