pub mod bedrock;
pub mod chat;
pub mod error;
pub mod loader;
pub mod server;

pub use bedrock::BedrockConfig;
pub use chat::ChatSettings;
pub use error::ConfigError;
pub use loader::{DEFAULT_ENV_FILE, EnvSource, ProcessEnv, load_env_file};
pub use server::{HttpServerConfig, ServerTarget, StdioServerConfig, TransportKind};
