//! Model clients

mod base;
mod bedrock;

pub use base::HttpClientBase;
pub use bedrock::BedrockClient;
