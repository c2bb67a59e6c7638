//! Dispatch of tool calls to whichever session is currently attached.

use super::tooling::{ToolInvokeError, ToolSession};
use crate::domain::ToolExecutionResult;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no tool-provider session is attached")]
    SessionNotReady,
    #[error(transparent)]
    Invoke(#[from] ToolInvokeError),
}

/// The orchestrator's view of the tool-provider connection. Empty before
/// connect and after disconnect.
#[derive(Clone, Default)]
pub struct SessionHandle(Option<Arc<dyn ToolSession>>);

impl SessionHandle {
    pub fn detached() -> Self {
        Self(None)
    }

    pub fn attached(session: Arc<dyn ToolSession>) -> Self {
        Self(Some(session))
    }

    pub fn attach(&mut self, session: Arc<dyn ToolSession>) {
        self.0 = Some(session);
    }

    /// Drop the reference, returning the session so the owner can shut it down
    pub fn release(&mut self) -> Option<Arc<dyn ToolSession>> {
        self.0.take()
    }

    pub fn is_ready(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(session) => f
                .debug_tuple("SessionHandle")
                .field(&session.server_name())
                .finish(),
            None => f.write_str("SessionHandle(detached)"),
        }
    }
}

/// Forward one call verbatim. The provider's result, including its error
/// flag, comes back uninterpreted; nothing is retried.
pub async fn invoke(
    handle: &SessionHandle,
    tool: &str,
    arguments: Value,
) -> Result<ToolExecutionResult, GatewayError> {
    let session = handle.0.as_ref().ok_or(GatewayError::SessionNotReady)?;
    debug!(server = session.server_name(), tool, "dispatching tool call");
    Ok(session.call_tool(tool, arguments).await?)
}
