//! MCP over streamable HTTP: every client message is a POST; the server
//! answers with JSON, an SSE stream, or `202 Accepted`.

use super::error::ToolInvokeError;
use super::interface::{ServerInfo, ToolSession};
use super::rpc::{self, Inbound, RequestIds, RpcChannel};
use crate::config::HttpServerConfig;
use crate::domain::{ToolDescriptor, ToolExecutionResult};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use sse_stream::SseStream;
use std::str::FromStr;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

pub const SESSION_HEADER: &str = "Mcp-Session-Id";
pub const PROTOCOL_HEADER: &str = "MCP-Protocol-Version";

const EVENT_STREAM_MIME_TYPE: &str = "text/event-stream";
const JSON_MIME_TYPE: &str = "application/json";

pub struct HttpSession {
    server: HttpServerConfig,
    http: Client,
    default_headers: HeaderMap,
    session_id: AsyncMutex<Option<String>>,
    protocol_version: AsyncMutex<Option<String>>,
    closed: AsyncMutex<bool>,
    ids: RequestIds,
}

impl HttpSession {
    pub fn new(server: HttpServerConfig) -> Result<Self, ToolInvokeError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &server.headers {
            let header_name = HeaderName::from_str(name).map_err(|_| {
                ToolInvokeError::transport(&server.name, format!("invalid header name '{name}'"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                ToolInvokeError::transport(&server.name, format!("invalid value for header '{name}'"))
            })?;
            default_headers.insert(header_name, header_value);
        }

        Ok(Self {
            server,
            http: Client::new(),
            default_headers,
            session_id: AsyncMutex::new(None),
            protocol_version: AsyncMutex::new(None),
            closed: AsyncMutex::new(false),
            ids: RequestIds::new(),
        })
    }

    /// Session id assigned by the server, once initialized
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.lock().await.clone()
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::transport(&self.server.name, message)
    }

    async fn post(&self, message: &Value) -> Result<Response, ToolInvokeError> {
        if *self.closed.lock().await {
            return Err(ToolInvokeError::Terminated {
                server: self.server.name.clone(),
            });
        }

        let mut request = self
            .http
            .post(&self.server.url)
            .headers(self.default_headers.clone())
            .header(ACCEPT, format!("{JSON_MIME_TYPE}, {EVENT_STREAM_MIME_TYPE}"))
            .json(message);
        if let Some(session_id) = self.session_id.lock().await.as_deref() {
            request = request.header(SESSION_HEADER, session_id);
        }
        if let Some(version) = self.protocol_version.lock().await.as_deref() {
            request = request.header(PROTOCOL_HEADER, version);
        }

        let response = request
            .send()
            .await
            .map_err(|err| self.transport_error(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ToolInvokeError::Http {
                server: self.server.name.clone(),
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            let mut current = self.session_id.lock().await;
            if current.as_deref() != Some(session_id) {
                debug!(server = %self.server.name, session_id, "MCP session id assigned");
                *current = Some(session_id.to_string());
            }
        }

        Ok(response)
    }

    /// Read the answer to request `key` out of a POST response body
    async fn read_response(&self, response: Response, key: &str) -> Result<Value, ToolInvokeError> {
        if matches!(response.status(), StatusCode::ACCEPTED | StatusCode::NO_CONTENT) {
            return Err(self.transport_error(format!(
                "server accepted request '{key}' without returning a response"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();

        if content_type.starts_with(EVENT_STREAM_MIME_TYPE) {
            return self.read_event_stream(response, key).await;
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err.to_string()))?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.name.clone(),
                source,
            })?;

        let candidates = match value {
            Value::Array(batch) => batch,
            single => vec![single],
        };
        for candidate in candidates {
            if let Some(body) = self.match_response(candidate, key).await {
                return Ok(body);
            }
        }
        Err(ToolInvokeError::invalid_payload(
            &self.server.name,
            format!("no response for request '{key}' in body"),
        ))
    }

    async fn read_event_stream(
        &self,
        response: Response,
        key: &str,
    ) -> Result<Value, ToolInvokeError> {
        let mut events = SseStream::from_byte_stream(response.bytes_stream()).boxed();
        while let Some(event) = events.next().await {
            let event = event.map_err(|err| self.transport_error(format!("SSE error: {err}")))?;
            let Some(data) = event.data.as_deref().map(str::trim) else {
                continue;
            };
            if data.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(data) {
                Ok(value) => {
                    if let Some(body) = self.match_response(value, key).await {
                        return Ok(body);
                    }
                }
                Err(source) => warn!(
                    server = %self.server.name,
                    %source,
                    "skipping non-JSON SSE event from MCP server"
                ),
            }
        }
        Err(ToolInvokeError::Terminated {
            server: self.server.name.clone(),
        })
    }

    async fn match_response(&self, value: Value, key: &str) -> Option<Value> {
        match rpc::classify(value) {
            Inbound::Response { key: got, body } if got == key => Some(body),
            Inbound::Response { key: got, .. } => {
                debug!(
                    server = %self.server.name,
                    response_id = got.as_str(),
                    "response for another request"
                );
                None
            }
            Inbound::Request { id, method } => {
                self.answer_server_request(id, &method).await;
                None
            }
            Inbound::Notification { method } => {
                debug!(
                    server = %self.server.name,
                    method = method.as_str(),
                    "received notification from server"
                );
                None
            }
            Inbound::Unrecognised => None,
        }
    }

    /// Reply to a request the server interleaved with its response stream
    async fn answer_server_request(&self, id: Value, method: &str) {
        let reply = rpc::reply_to_server_request(&self.server.name, id, method);
        if let Err(err) = self.post(&reply).await {
            warn!(server = %self.server.name, method, %err, "failed to answer server request");
        }
    }
}

#[async_trait]
impl RpcChannel for HttpSession {
    fn server(&self) -> &str {
        &self.server.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.ids.next();
        let response = self.post(&rpc::request(&id, method, params)).await?;
        let body = self.read_response(response, &id).await?;
        rpc::into_result(&self.server.name, body)
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        self.post(&rpc::notification(method, params)).await?;
        Ok(())
    }
}

#[async_trait]
impl ToolSession for HttpSession {
    fn server_name(&self) -> &str {
        &self.server.name
    }

    async fn initialize(&self) -> Result<ServerInfo, ToolInvokeError> {
        let info = rpc::handshake(self).await?;
        *self.protocol_version.lock().await = Some(
            info.protocol_version
                .clone()
                .unwrap_or_else(|| rpc::PROTOCOL_VERSION.to_string()),
        );
        let session_id = self.session_id().await;
        info!(
            server = %self.server.name,
            url = %self.server.url,
            session_id = session_id.as_deref(),
            "Connected to MCP server over HTTP"
        );
        Ok(info)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        rpc::list_all_tools(self).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolExecutionResult, ToolInvokeError> {
        rpc::call_tool(self, name, arguments).await
    }

    async fn shutdown(&self) {
        {
            let mut closed = self.closed.lock().await;
            if *closed {
                return;
            }
            *closed = true;
        }

        let Some(session_id) = self.session_id.lock().await.take() else {
            return;
        };
        let result = self
            .http
            .delete(&self.server.url)
            .headers(self.default_headers.clone())
            .header(SESSION_HEADER, session_id)
            .send()
            .await;
        match result {
            Ok(response)
                if response.status().is_success()
                    || response.status() == StatusCode::METHOD_NOT_ALLOWED =>
            {
                debug!(server = %self.server.name, "MCP HTTP session closed");
            }
            Ok(response) => warn!(
                server = %self.server.name,
                status = response.status().as_u16(),
                "server refused to close MCP session"
            ),
            Err(err) => warn!(server = %self.server.name, %err, "failed to close MCP session"),
        }
    }
}
