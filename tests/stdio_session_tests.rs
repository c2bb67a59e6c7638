// Subprocess session tests, driven by a small shell script posing as an MCP server.
#![cfg(unix)]

use mcp_chatbot::config::StdioServerConfig;
use mcp_chatbot::tooling::{StdioSession, ToolInvokeError, ToolSession, establish};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const SCRIPTED_SERVER: &str = r#"
read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":"req-1","result":{"protocolVersion":"2025-06-18","capabilities":{},"serverInfo":{"name":"sh-mock","version":"0.0.1"}}}'
read -r line
read -r line
printf '\033[32mINFO\033[0m listing tools\n'
printf '\n'
printf '%s\n' '{"jsonrpc":"2.0","method":"notifications/tools/list_changed"}'
printf '%s\n' '{"jsonrpc":"2.0","id":"srv-1","method":"ping"}'
read -r pong
case "$pong" in
  *'"result"'*) ;;
  *) exit 3 ;;
esac
printf '%s\n' '{"jsonrpc":"2.0","id":"req-2","result":{"tools":[{"name":"echo","description":"Echo input","inputSchema":{"type":"object"}}]}}'
read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":"req-3","result":{"content":[{"type":"text","text":"echo failed"}],"isError":true}}'
read -r line
"#;

fn scripted(name: &str, script: &str) -> StdioServerConfig {
    StdioServerConfig::new(name, "sh")
        .with_args(["-c", script])
        .with_env("MCP_TEST", "1")
}

#[tokio::test]
async fn handshake_tools_and_call_over_stdio() {
    let session = Arc::new(StdioSession::spawn(scripted("sh-mock", SCRIPTED_SERVER)).expect("spawn"));

    let connected = tokio::time::timeout(Duration::from_secs(10), establish(session.clone()))
        .await
        .expect("handshake finished")
        .expect("connected");
    assert_eq!(connected.info.name, "sh-mock");
    assert_eq!(connected.tools.len(), 1);
    assert_eq!(connected.tools[0].name, "echo");

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        session.call_tool("echo", json!({"text": "hi"})),
    )
    .await
    .expect("call finished")
    .expect("call");
    assert!(result.is_error);

    session.shutdown().await;
    let err = session
        .call_tool("echo", json!({}))
        .await
        .expect_err("stopped session");
    assert!(matches!(err, ToolInvokeError::Terminated { .. }));
}

#[tokio::test]
async fn non_utf8_log_line_is_skipped() {
    let script = r#"
read -r line
printf 'npm notice caf\351\n'
printf '%s\n' '{"jsonrpc":"2.0","id":"req-1","result":{"protocolVersion":"2025-06-18","capabilities":{},"serverInfo":{"name":"latin1-noise"}}}'
read -r line
read -r line
"#;
    let session = StdioSession::spawn(scripted("latin1-noise", script)).expect("spawn");

    let info = tokio::time::timeout(Duration::from_secs(10), session.initialize())
        .await
        .expect("initialize finished")
        .expect("noise line skipped");
    assert_eq!(info.name, "latin1-noise");

    session.shutdown().await;
}

#[tokio::test]
async fn server_exit_fails_pending_request() {
    let session = StdioSession::spawn(scripted("short-lived", "read -r line; exit 0")).expect("spawn");

    let err = tokio::time::timeout(Duration::from_secs(10), session.initialize())
        .await
        .expect("initialize finished")
        .expect_err("server exited");
    assert!(matches!(
        err,
        ToolInvokeError::Terminated { .. } | ToolInvokeError::Transport { .. }
    ));
}

#[tokio::test]
async fn missing_command_fails_to_spawn() {
    let config = StdioServerConfig::new("ghost", "/nonexistent/mcp-server-binary");
    let err = StdioSession::spawn(config).err().expect("spawn error");
    assert!(matches!(err, ToolInvokeError::Spawn { .. }));
}
