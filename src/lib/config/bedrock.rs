use super::error::ConfigError;
use super::loader::{EnvSource, ProcessEnv, optional, require_http_url, required};
use std::fmt;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";

pub const TOKEN_VAR: &str = "AWS_BEARER_TOKEN_BEDROCK";
pub const REGION_VAR: &str = "BEDROCK_REGION";
pub const MODEL_VAR: &str = "BEDROCK_MODEL_ID";
pub const ENDPOINT_VAR: &str = "BEDROCK_ENDPOINT";

/// Bedrock runtime settings
#[derive(Clone, PartialEq, Eq)]
pub struct BedrockConfig {
    pub region: String,
    pub model_id: String,
    /// Bedrock API key, sent as a bearer token
    pub bearer_token: String,
    /// Overrides the regional endpoint (VPC endpoints, local mocks)
    pub endpoint_override: Option<String>,
}

impl BedrockConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self, ConfigError> {
        let bearer_token = required(source, TOKEN_VAR)?;
        let endpoint_override = optional(source, ENDPOINT_VAR)
            .map(|value| require_http_url(ENDPOINT_VAR, value))
            .transpose()?;

        Ok(Self {
            region: optional(source, REGION_VAR).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            model_id: optional(source, MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            bearer_token,
            endpoint_override,
        })
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn endpoint(&self) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }
}

impl fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("model_id", &self.model_id)
            .field("bearer_token", &"<redacted>")
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}
