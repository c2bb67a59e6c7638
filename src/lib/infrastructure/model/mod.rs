//! Model infrastructure module
//!
//! Provides the language-model backend behind a small trait so the
//! conversation loop can be driven by Bedrock or by a scripted stand-in.
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - ModelProvider trait
//! - `adapter` - Converse wire format adapter
//! - `clients` - HTTP client implementations

pub mod adapter;
pub mod clients;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use clients::BedrockClient;
pub use traits::ModelProvider;
pub use types::{
    ModelError, ModelRequest, ModelResponse, ModelToolSpec, TokenUsage, ToolConfiguration,
};
