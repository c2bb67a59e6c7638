//! Bedrock Converse client implementation

use async_trait::async_trait;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::BedrockConfig;
use crate::infrastructure::model::adapter::ConverseAdapter;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse};

const PROVIDER_ID: &str = "bedrock";

/// Client for the Bedrock Runtime `converse` operation, authenticated with a
/// Bedrock API key passed as a bearer token.
#[derive(Clone)]
pub struct BedrockClient {
    base: HttpClientBase,
}

impl BedrockClient {
    pub fn from_config(config: &BedrockConfig) -> Self {
        Self {
            base: HttpClientBase::new(
                PROVIDER_ID.to_string(),
                config.endpoint(),
                Some(config.bearer_token.clone()),
            ),
        }
    }
}

#[async_trait]
impl ModelProvider for BedrockClient {
    async fn converse(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self
            .base
            .build_url(&["model", request.model_id.as_str(), "converse"])?;
        let payload = ConverseAdapter::to_request_body(&request);

        info!(
            provider = self.base.id.as_str(),
            model = request.model_id.as_str(),
            messages = request.messages.len(),
            tools = request.tool_config.as_ref().map_or(0, |c| c.tools.len()),
            "Sending converse request"
        );

        let body = self.base.post_with_bearer(url, &payload).await?;
        let response = ConverseAdapter::decode_response(&self.base.id, &body)?;
        debug!(
            stop_reason = response.stop_reason.as_deref(),
            input_tokens = response.usage.map(|u| u.input_tokens),
            output_tokens = response.usage.map(|u| u.output_tokens),
            "Received converse response"
        );
        Ok(response)
    }
}
