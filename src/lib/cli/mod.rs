use std::path::PathBuf;

use clap::Parser;

use crate::config::TransportKind;

#[derive(Parser, Debug)]
#[command(
    name = "mcp-chat",
    version,
    about = "Chat with a Bedrock model that can call tools on an MCP server"
)]
pub struct Cli {
    /// How to reach the MCP server
    #[arg(long, short, value_enum, default_value_t = TransportKind::Stdio)]
    pub transport: TransportKind,
    /// Environment file loaded before reading configuration
    #[arg(long)]
    pub env_file: Option<PathBuf>,
    /// Override the Bedrock model id
    #[arg(long)]
    pub model: Option<String>,
}

impl Cli {
    /// Arguments for a binary whose transport is fixed
    pub fn for_transport(transport: TransportKind) -> Self {
        let mut cli = Self::parse();
        cli.transport = transport;
        cli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_stdio() {
        let cli = Cli::try_parse_from(["mcp-chat"]).expect("parse");
        assert_eq!(cli.transport, TransportKind::Stdio);
        assert!(cli.env_file.is_none());
        assert!(cli.model.is_none());
    }

    #[test]
    fn parses_http_transport_and_overrides() {
        let cli = Cli::try_parse_from([
            "mcp-chat",
            "--transport",
            "http",
            "--env-file",
            "local.env",
            "--model",
            "anthropic.claude-3-haiku",
        ])
        .expect("parse");
        assert_eq!(cli.transport, TransportKind::Http);
        assert_eq!(cli.env_file, Some(PathBuf::from("local.env")));
        assert_eq!(cli.model.as_deref(), Some("anthropic.claude-3-haiku"));
    }
}
