use super::error::ToolInvokeError;
use super::http::HttpSession;
use super::interface::{ServerInfo, ToolSession};
use super::process::StdioSession;
use crate::config::ServerTarget;
use crate::domain::ToolDescriptor;
use std::sync::Arc;
use tracing::{info, warn};

/// An initialized session together with the tools it offered at connect time.
pub struct ConnectedServer {
    pub session: Arc<dyn ToolSession>,
    pub info: ServerInfo,
    pub tools: Vec<ToolDescriptor>,
}

impl ConnectedServer {
    pub fn name(&self) -> &str {
        self.session.server_name()
    }
}

/// Open a session for `target`, run the handshake and capture its tool list.
pub async fn connect(target: &ServerTarget) -> Result<ConnectedServer, ToolInvokeError> {
    let session: Arc<dyn ToolSession> = match target {
        ServerTarget::Stdio(config) => Arc::new(StdioSession::spawn(config.clone())?),
        ServerTarget::Http(config) => Arc::new(HttpSession::new(config.clone())?),
    };
    establish(session).await
}

/// Initialize an already-built session and list its tools. The session is
/// shut down if either step fails.
pub async fn establish(session: Arc<dyn ToolSession>) -> Result<ConnectedServer, ToolInvokeError> {
    let info = match session.initialize().await {
        Ok(info) => info,
        Err(err) => {
            warn!(server = session.server_name(), %err, "MCP handshake failed");
            session.shutdown().await;
            return Err(err);
        }
    };

    let tools = match session.list_tools().await {
        Ok(tools) => tools,
        Err(err) => {
            warn!(server = session.server_name(), %err, "failed to list MCP tools");
            session.shutdown().await;
            return Err(err);
        }
    };

    info!(
        server = session.server_name(),
        remote = %info.name,
        version = info.version.as_deref(),
        tool_count = tools.len(),
        "MCP server ready"
    );
    Ok(ConnectedServer {
        session,
        info,
        tools,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToolExecutionResult;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeSession {
        fail_listing: bool,
        shut_down: AtomicBool,
    }

    impl FakeSession {
        fn new(fail_listing: bool) -> Self {
            Self {
                fail_listing,
                shut_down: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ToolSession for FakeSession {
        fn server_name(&self) -> &str {
            "fake"
        }

        async fn initialize(&self) -> Result<ServerInfo, ToolInvokeError> {
            Ok(ServerInfo {
                name: "fake-remote".into(),
                version: Some("1.0.0".into()),
                ..ServerInfo::default()
            })
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
            if self.fail_listing {
                return Err(ToolInvokeError::Terminated {
                    server: "fake".into(),
                });
            }
            Ok(vec![ToolDescriptor::new(
                "list-datasources",
                Some("List data sources"),
                json!({"type": "object"}),
            )])
        }

        async fn call_tool(
            &self,
            _name: &str,
            _arguments: Value,
        ) -> Result<ToolExecutionResult, ToolInvokeError> {
            Ok(ToolExecutionResult::success(Vec::new()))
        }

        async fn shutdown(&self) {
            self.shut_down.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn captures_info_and_tools() {
        let connected = establish(Arc::new(FakeSession::new(false)))
            .await
            .expect("connected");
        assert_eq!(connected.name(), "fake");
        assert_eq!(connected.info.name, "fake-remote");
        assert_eq!(connected.tools.len(), 1);
        assert_eq!(connected.tools[0].name, "list-datasources");
    }

    #[tokio::test]
    async fn shuts_down_when_listing_fails() {
        let session = Arc::new(FakeSession::new(true));
        let result = establish(session.clone()).await;
        assert!(matches!(result, Err(ToolInvokeError::Terminated { .. })));
        assert!(session.shut_down.load(Ordering::SeqCst));
    }
}
