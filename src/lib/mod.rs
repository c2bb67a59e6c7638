pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{chatbot, stdio, tooling};
pub use cli::Cli;
pub use config::{BedrockConfig, ChatSettings, ServerTarget, TransportKind};
pub use domain::types;
pub use infrastructure::model;

use application::chatbot::ChatBot;
use application::stdio::StdioError;
use application::tooling::{ToolInvokeError, connect};
use config::ConfigError;
use model::BedrockClient;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not connect to the MCP server: {0}")]
    Connect(#[from] ToolInvokeError),
    #[error(transparent)]
    Stdio(#[from] StdioError),
    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration, connect to the tool provider and run the chat prompt
/// until the user quits.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let env_file = config::load_env_file(cli.env_file.as_deref())?;
    init_tracing();
    if let Some(path) = env_file {
        debug!(path = %path.display(), "environment file applied");
    }

    let transport = cli.transport;
    let mut bedrock = BedrockConfig::from_env()?;
    if let Some(model) = cli.model {
        bedrock = bedrock.with_model_id(model);
    }
    let target = ServerTarget::from_env(transport)?;
    let settings = ChatSettings::from_env()?;
    debug!(?bedrock, ?target, ?settings, "configuration loaded");

    println!("Connecting to MCP Server ({transport})...");
    std::io::stdout().flush()?;
    let server = connect(&target).await?;
    println!(
        "Connected to MCP Server ({transport}). Available tools: {}",
        server.tools.len()
    );
    let server_name = server.name().to_string();

    let provider = BedrockClient::from_config(&bedrock);
    let mut bot = ChatBot::new(provider, bedrock.model_id.clone(), server.tools)
        .with_settings(settings);
    bot.attach(server.session);
    info!(
        server = server_name.as_str(),
        transport = transport.as_str(),
        model = bot.model_id(),
        tools = bot.tools().len(),
        conversation = bot.conversation_id(),
        "starting chat session"
    );

    let outcome = stdio::run(&mut bot, transport).await;

    if let Some(session) = bot.detach() {
        session.shutdown().await;
    }
    info!("chat session closed");
    outcome.map_err(AppError::from)
}

/// Install the stderr subscriber once. `RUST_LOG` overrides the quiet default.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
