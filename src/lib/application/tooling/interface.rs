use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;
use crate::domain::{ToolDescriptor, ToolExecutionResult};

/// What the server reported about itself during `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: Option<String>,
    pub protocol_version: Option<String>,
    pub instructions: Option<String>,
}

/// A live connection to a tool provider, independent of transport.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Name used in logs and errors
    fn server_name(&self) -> &str;

    /// Run the MCP handshake; must complete before any other call
    async fn initialize(&self) -> Result<ServerInfo, ToolInvokeError>;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolExecutionResult, ToolInvokeError>;

    /// Release the connection. Further calls fail.
    async fn shutdown(&self);
}
