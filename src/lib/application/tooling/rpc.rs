//! JSON-RPC plumbing shared by the stdio and HTTP sessions.

use super::error::ToolInvokeError;
use super::interface::ServerInfo;
use crate::domain::{ToolDescriptor, ToolExecutionResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Method-not-found, used to refuse server requests we do not implement
const METHOD_NOT_FOUND: i64 = -32601;

pub(super) struct RequestIds(AtomicU64);

impl RequestIds {
    pub(super) fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub(super) fn next(&self) -> String {
        let id = self.0.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }
}

pub(super) fn request(id: &str, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

pub(super) fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    })
}

fn response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() }
    })
}

/// Reply to a request initiated by the server: `ping` is answered, anything
/// else is refused with method-not-found
pub(super) fn reply_to_server_request(server: &str, id: Value, method: &str) -> Value {
    match method {
        "ping" => response(id, json!({})),
        other => {
            warn!(server, method = other, "server sent unsupported request");
            error_response(
                id,
                METHOD_NOT_FOUND,
                format!("client does not implement method '{other}'"),
            )
        }
    }
}

/// An inbound message, sorted by JSON-RPC shape
#[derive(Debug, PartialEq)]
pub(super) enum Inbound {
    Response { key: String, body: Value },
    Request { id: Value, method: String },
    Notification { method: String },
    Unrecognised,
}

pub(super) fn classify(value: Value) -> Inbound {
    let method = value
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);
    match (value.get("id").cloned(), method) {
        (Some(id), Some(method)) => Inbound::Request { id, method },
        (Some(id), None) => match response_key(&id) {
            Some(key) => Inbound::Response { key, body: value },
            None => Inbound::Unrecognised,
        },
        (None, Some(method)) => Inbound::Notification { method },
        (None, None) => Inbound::Unrecognised,
    }
}

pub(super) fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

/// Split a response envelope into its `result` or a typed error
pub(super) fn into_result(server: &str, body: Value) -> Result<Value, ToolInvokeError> {
    if let Some(error) = body.get("error") {
        return Err(match error.as_object() {
            Some(err) => ToolInvokeError::Rpc {
                server: server.to_string(),
                code: err.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            },
            None => ToolInvokeError::transport(server, "missing error payload in response"),
        });
    }
    Ok(body.get("result").cloned().unwrap_or(Value::Null))
}

/// Request/notification transport underneath a session
#[async_trait]
pub(super) trait RpcChannel: Send + Sync {
    fn server(&self) -> &str;

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError>;

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolInvokeError>;
}

pub(super) fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {}
    })
}

pub(super) async fn handshake(channel: &dyn RpcChannel) -> Result<ServerInfo, ToolInvokeError> {
    let result = channel.request("initialize", initialize_params()).await?;
    let server_info = result.get("serverInfo");
    let info = ServerInfo {
        name: server_info
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(channel.server())
            .to_string(),
        version: server_info
            .and_then(|info| info.get("version"))
            .and_then(Value::as_str)
            .map(str::to_string),
        protocol_version: result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .map(str::to_string),
        instructions: result
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    if info.protocol_version.as_deref() != Some(PROTOCOL_VERSION) {
        debug!(
            server = channel.server(),
            requested = PROTOCOL_VERSION,
            negotiated = info.protocol_version.as_deref(),
            "server negotiated a different protocol version"
        );
    }
    channel
        .notify("notifications/initialized", json!({}))
        .await?;
    Ok(info)
}

/// Fetch every page of `tools/list`
pub(super) async fn list_all_tools(
    channel: &dyn RpcChannel,
) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
    let mut tools = Vec::new();
    let mut seen_cursors = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let params = match &cursor {
            Some(cursor) => json!({ "cursor": cursor }),
            None => json!({}),
        };
        let result = channel.request("tools/list", params).await?;
        let page = result
            .get("tools")
            .cloned()
            .ok_or_else(|| ToolInvokeError::invalid_payload(channel.server(), "tools/list without 'tools'"))?;
        let descriptors: Vec<ToolDescriptor> =
            serde_json::from_value(page).map_err(|source| ToolInvokeError::InvalidJson {
                server: channel.server().to_string(),
                source,
            })?;
        tools.extend(descriptors);

        match result.get("nextCursor").and_then(Value::as_str) {
            Some(next) if seen_cursors.insert(next.to_string()) => cursor = Some(next.to_string()),
            Some(next) => {
                warn!(server = channel.server(), cursor = next, "tools/list cursor repeated, stopping");
                break;
            }
            None => break,
        }
    }

    Ok(tools)
}

pub(super) async fn call_tool(
    channel: &dyn RpcChannel,
    name: &str,
    arguments: Value,
) -> Result<ToolExecutionResult, ToolInvokeError> {
    let params = json!({
        "name": name,
        "arguments": match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        }
    });
    let result = channel.request("tools/call", params).await?;
    serde_json::from_value(result).map_err(|source| ToolInvokeError::InvalidJson {
        server: channel.server().to_string(),
        source,
    })
}
