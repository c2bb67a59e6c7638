//! Model types - Request, Response, and Error types

use crate::types::Turn;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool description in the shape the model API expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tool configuration attached to a request; only built when tools exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfiguration {
    pub tools: Vec<ModelToolSpec>,
}

/// Model request for one converse round-trip
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model_id: String,
    pub messages: Vec<Turn>,
    pub tool_config: Option<ToolConfiguration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Model response: the assistant turn plus bookkeeping
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Turn,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    pub fn new(message: Turn) -> Self {
        Self {
            message,
            stop_reason: None,
            usage: None,
        }
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires a bearer token")]
    MissingApiKey { provider: String },
    #[error("invalid endpoint for provider '{provider}': {reason}")]
    InvalidEndpoint { provider: String, reason: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' rejected the request ({status}): {message}")]
    Api {
        provider: String,
        status: StatusCode,
        message: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn invalid_endpoint(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn api(provider: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' needs a bearer token.")
            }
            ModelError::InvalidEndpoint { provider, .. } => {
                format!("The endpoint configured for '{provider}' is not usable.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("The request to '{provider}' timed out.")
                } else {
                    format!("Network error while talking to '{provider}'.")
                }
            }
            ModelError::Api {
                provider,
                status,
                message,
            } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    format!("'{provider}' refused the credentials: {message}")
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    format!("'{provider}' is throttling requests, try again shortly.")
                }
                _ => format!("'{provider}' failed with {}: {message}", status.as_u16()),
            },
            ModelError::InvalidResponse { provider, .. } => {
                format!("The response from '{provider}' could not be understood.")
            }
        }
    }
}
