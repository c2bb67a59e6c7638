use crate::application::gateway::GatewayError;
use crate::model::ModelError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("tool '{tool}' could not be invoked: {source}")]
    Tool {
        tool: String,
        #[source]
        source: GatewayError,
    },
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("stopped after {limit} tool rounds without a final answer")]
    ToolRoundLimit { limit: usize },
}

impl ChatError {
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Model(err) => err.user_message(),
            ChatError::Tool {
                source: GatewayError::SessionNotReady,
                ..
            } => "The tool provider is not connected.".to_string(),
            ChatError::Tool {
                tool,
                source: GatewayError::Invoke(err),
            } => format!("Tool \"{tool}\" failed: {err}"),
            ChatError::Timeout { operation, after } => {
                format!("The {operation} did not finish within {}s.", after.as_secs())
            }
            ChatError::ToolRoundLimit { limit } => {
                format!("Stopped after {limit} rounds of tool calls without a final answer.")
            }
        }
    }
}
