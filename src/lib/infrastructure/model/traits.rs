//! Model traits

use super::types::{ModelError, ModelRequest, ModelResponse};
use async_trait::async_trait;

/// Trait for model backends that answer one converse request at a time
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send the full transcript and receive the next assistant turn
    async fn converse(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}
