use super::error::ToolInvokeError;
use super::interface::{ServerInfo, ToolSession};
use super::rpc::{self, Inbound, RequestIds, RpcChannel};
use crate::config::StdioServerConfig;
use crate::domain::{ToolDescriptor, ToolExecutionResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

/// Tool provider running as a child process, speaking newline-delimited
/// JSON-RPC over its stdin/stdout.
#[derive(Clone)]
pub struct StdioSession {
    inner: Arc<StdioSessionInner>,
}

struct StdioSessionInner {
    server: StdioServerConfig,
    child: AsyncMutex<Option<Child>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: AsyncMutex<HashMap<String, Responder>>,
    ids: RequestIds,
}

impl StdioSession {
    /// Spawn the server process and start reading its output. The MCP
    /// handshake happens in [`ToolSession::initialize`].
    pub fn spawn(server: StdioServerConfig) -> Result<Self, ToolInvokeError> {
        let mut command = Command::new(&server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &server.workdir {
            command.current_dir(dir);
        }
        if !server.args.is_empty() {
            command.args(&server.args);
        }
        for (key, value) in &server.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: server.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolInvokeError::transport(&server.name, "failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolInvokeError::transport(&server.name, "failed to capture server stdout"))?;

        info!(
            server = %server.name,
            command = %server.command.display(),
            pid = child.id(),
            "Spawned MCP server process"
        );

        let inner = Arc::new(StdioSessionInner {
            server,
            child: AsyncMutex::new(Some(child)),
            writer: AsyncMutex::new(Some(BufWriter::new(stdin))),
            pending: AsyncMutex::new(HashMap::new()),
            ids: RequestIds::new(),
        });

        let reader = Arc::clone(&inner);
        tokio::spawn(async move {
            reader.reader_loop(stdout).await;
        });

        Ok(Self { inner })
    }
}

#[async_trait]
impl ToolSession for StdioSession {
    fn server_name(&self) -> &str {
        &self.inner.server.name
    }

    async fn initialize(&self) -> Result<ServerInfo, ToolInvokeError> {
        rpc::handshake(self.inner.as_ref()).await
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        rpc::list_all_tools(self.inner.as_ref()).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolExecutionResult, ToolInvokeError> {
        rpc::call_tool(self.inner.as_ref(), name, arguments).await
    }

    async fn shutdown(&self) {
        self.inner.reset().await;
    }
}

#[async_trait]
impl RpcChannel for StdioSessionInner {
    fn server(&self) -> &str {
        &self.server.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.ids.next();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        if let Err(err) = self.write_message(&rpc::request(&id, method, params)).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(Ok(body)) => rpc::into_result(&self.server.name, body),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.name.clone(),
            }),
        }
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        self.write_message(&rpc::notification(method, params)).await
    }
}

impl StdioSessionInner {
    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout) {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(server = %self.server.name, %err, "failed to read from MCP server");
                    break;
                }
            }
            // non-UTF-8 noise ends up as invalid JSON below
            let raw = String::from_utf8_lossy(&buf);
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('\u{1b}') {
                debug!(
                    server = %self.server.name,
                    line = trimmed,
                    "skipping non-JSON ANSI log line from MCP server"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    if let Err(err) = self.process_inbound_message(value).await {
                        warn!(
                            server = %self.server.name,
                            %err,
                            "failed to process message from MCP server"
                        );
                    }
                }
                Err(source) => {
                    warn!(
                        server = %self.server.name,
                        line = trimmed,
                        %source,
                        "received invalid JSON from MCP server"
                    );
                }
            }
        }

        debug!(server = %self.server.name, "MCP server output closed");
        self.reset().await;
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), ToolInvokeError> {
        match rpc::classify(value) {
            Inbound::Response { key, body } => {
                let responder = self.pending.lock().await.remove(&key);
                match responder {
                    Some(sender) => {
                        let _ = sender.send(Ok(body));
                    }
                    None => debug!(
                        server = %self.server.name,
                        response_id = key.as_str(),
                        "received response for unknown request"
                    ),
                }
                Ok(())
            }
            Inbound::Request { id, method } => self.handle_server_request(id, &method).await,
            Inbound::Notification { method } => {
                self.handle_notification(&method);
                Ok(())
            }
            Inbound::Unrecognised => Ok(()),
        }
    }

    async fn handle_server_request(&self, id: Value, method: &str) -> Result<(), ToolInvokeError> {
        let reply = rpc::reply_to_server_request(&self.server.name, id, method);
        self.write_message(&reply).await
    }

    fn handle_notification(&self, method: &str) {
        debug!(
            server = %self.server.name,
            method,
            "received notification from server"
        );
        if method == "notifications/tools/list_changed" {
            info!(
                server = %self.server.name,
                "server tool list changed; keeping the catalogue captured at connect time"
            );
        }
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.name.clone(),
                source,
            })?;

        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or_else(|| ToolInvokeError::Terminated {
            server: self.server.name.clone(),
        })?;
        let transport = |source: std::io::Error| {
            ToolInvokeError::transport(&self.server.name, source.to_string())
        };
        stream.write_all(encoded.as_bytes()).await.map_err(transport)?;
        stream.write_all(b"\n").await.map_err(transport)?;
        stream.flush().await.map_err(transport)?;
        Ok(())
    }

    async fn reset(&self) {
        self.writer.lock().await.take();

        let running = self.child.lock().await.take();
        if let Some(mut child) = running {
            if let Err(err) = child.kill().await {
                debug!(
                    server = %self.server.name,
                    %err,
                    "failed to kill MCP server process (may have already exited)"
                );
            }
            let _ = child.wait().await;
            info!(server = %self.server.name, "MCP server process stopped");
        }

        self.fail_all_pending().await;
    }

    async fn fail_all_pending(&self) {
        let mut pending = self.pending.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.name.clone(),
            }));
        }
    }
}
