use super::error::ConfigError;
use super::loader::{EnvSource, ProcessEnv, optional_u64};
use std::time::Duration;

pub const CALL_TIMEOUT_VAR: &str = "CHAT_CALL_TIMEOUT_SECS";
pub const MAX_TOOL_ROUNDS_VAR: &str = "CHAT_MAX_TOOL_ROUNDS";

/// Optional limits for the conversation loop. Both are off unless set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatSettings {
    pub call_timeout: Option<Duration>,
    pub max_tool_rounds: Option<usize>,
}

impl ChatSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            call_timeout: optional_u64(source, CALL_TIMEOUT_VAR)?.map(Duration::from_secs),
            max_tool_rounds: optional_u64(source, MAX_TOOL_ROUNDS_VAR)?
                .map(|rounds| usize::try_from(rounds).unwrap_or(usize::MAX)),
        })
    }
}
