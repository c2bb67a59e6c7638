// Configuration loading tests - environment lookups and env files.

use mcp_chatbot::config::{
    BedrockConfig, ChatSettings, ConfigError, ServerTarget, TransportKind, load_env_file,
};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

fn source(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
    pairs.iter().copied().collect()
}

#[test]
fn bedrock_requires_bearer_token() {
    let result = BedrockConfig::from_source(&source(&[("BEDROCK_REGION", "eu-west-1")]));
    assert!(matches!(
        result,
        Err(ConfigError::MissingVar {
            name: "AWS_BEARER_TOKEN_BEDROCK"
        })
    ));
}

#[test]
fn bedrock_defaults_and_regional_endpoint() {
    let config = BedrockConfig::from_source(&source(&[
        ("AWS_BEARER_TOKEN_BEDROCK", "abc"),
        ("BEDROCK_REGION", "eu-west-1"),
    ]))
    .expect("config");
    assert_eq!(config.model_id, "us.anthropic.claude-sonnet-4-5-20250929-v1:0");
    assert_eq!(config.endpoint(), "https://bedrock-runtime.eu-west-1.amazonaws.com");
    assert!(!format!("{config:?}").contains("abc"));

    let config = config.with_model_id("anthropic.claude-3-haiku");
    assert_eq!(config.model_id, "anthropic.claude-3-haiku");
}

#[test]
fn bedrock_endpoint_override_must_be_http() {
    let result = BedrockConfig::from_source(&source(&[
        ("AWS_BEARER_TOKEN_BEDROCK", "abc"),
        ("BEDROCK_ENDPOINT", "bedrock.local"),
    ]));
    assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
}

#[test]
fn http_target_needs_url() {
    let result = ServerTarget::from_source(TransportKind::Http, &source(&[]));
    assert!(matches!(
        result,
        Err(ConfigError::MissingVar {
            name: "MCP_SERVER_URL"
        })
    ));
}

#[test]
fn http_target_accepts_legacy_url_and_headers() {
    let target = ServerTarget::from_source(
        TransportKind::Http,
        &source(&[
            ("TABLEAU_MCP_URL", "https://mcp.example.com/tableau-mcp"),
            ("MCP_SERVER_HEADERS", "Authorization: Bearer t0k; X-Site: sales"),
            ("MCP_SERVER_NAME", "tableau"),
        ]),
    )
    .expect("target");

    assert_eq!(target.kind(), TransportKind::Http);
    assert_eq!(target.name(), "tableau");
    let ServerTarget::Http(config) = target else {
        panic!("expected http target");
    };
    assert_eq!(config.url, "https://mcp.example.com/tableau-mcp");
    assert_eq!(
        config.headers.get("Authorization").map(String::as_str),
        Some("Bearer t0k")
    );
    assert_eq!(config.headers.get("X-Site").map(String::as_str), Some("sales"));
}

#[test]
fn malformed_header_entry_is_rejected() {
    let result = ServerTarget::from_source(
        TransportKind::Http,
        &source(&[
            ("MCP_SERVER_URL", "http://localhost:3927/mcp"),
            ("MCP_SERVER_HEADERS", "no-colon-here"),
        ]),
    );
    assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
}

#[test]
fn stdio_target_defaults_to_tableau_server() {
    let target = ServerTarget::from_source(
        TransportKind::Stdio,
        &source(&[
            ("TABLEAU_SERVER", "https://tableau.example.com"),
            ("TABLEAU_PAT_NAME", "ci"),
            ("MCP_SERVER_ENV_KEYS", "LOG_LEVEL, MISSING"),
            ("MCP_SERVER_ENV_LOG_LEVEL", "debug"),
        ]),
    )
    .expect("target");

    let ServerTarget::Stdio(config) = target else {
        panic!("expected stdio target");
    };
    assert_eq!(config.command, PathBuf::from("npx"));
    assert_eq!(config.args, ["-y", "@tableau/mcp-server@latest"]);
    assert_eq!(config.env.get("TRANSPORT").map(String::as_str), Some("stdio"));
    assert_eq!(
        config.env.get("SERVER").map(String::as_str),
        Some("https://tableau.example.com")
    );
    assert_eq!(config.env.get("PAT_NAME").map(String::as_str), Some("ci"));
    assert_eq!(config.env.get("EXCLUDE_TOOLS").map(String::as_str), Some(""));
    assert_eq!(config.env.get("LOG_LEVEL").map(String::as_str), Some("debug"));
    assert!(!config.env.contains_key("MISSING"));
    assert!(config.workdir.is_none());
}

#[test]
fn stdio_command_and_args_are_overridable() {
    let target = ServerTarget::from_source(
        TransportKind::Stdio,
        &source(&[
            ("MCP_SERVER_COMMAND", "/opt/mcp/bin/server"),
            ("MCP_SERVER_ARGS", "--port 0 --verbose"),
            ("MCP_SERVER_WORKDIR", "/srv/mcp"),
        ]),
    )
    .expect("target");
    let ServerTarget::Stdio(config) = target else {
        panic!("expected stdio target");
    };
    assert_eq!(config.command, PathBuf::from("/opt/mcp/bin/server"));
    assert_eq!(config.args, ["--port", "0", "--verbose"]);
    assert_eq!(config.workdir, Some(PathBuf::from("/srv/mcp")));
}

#[test]
fn chat_settings_are_opt_in() {
    let settings = ChatSettings::from_source(&source(&[])).expect("settings");
    assert_eq!(settings, ChatSettings::default());

    let settings = ChatSettings::from_source(&source(&[
        ("CHAT_CALL_TIMEOUT_SECS", "90"),
        ("CHAT_MAX_TOOL_ROUNDS", "8"),
    ]))
    .expect("settings");
    assert_eq!(settings.call_timeout, Some(Duration::from_secs(90)));
    assert_eq!(settings.max_tool_rounds, Some(8));

    let result = ChatSettings::from_source(&source(&[("CHAT_CALL_TIMEOUT_SECS", "0")]));
    assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
}

#[test]
fn explicit_env_file_is_loaded() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("chat.env");
    fs::write(&path, "MCP_CHATBOT_CONFIG_TEST_MARKER=from-file\n").expect("write env file");

    let loaded = load_env_file(Some(path.as_path())).expect("load");
    assert_eq!(loaded.as_deref(), Some(path.as_path()));
    assert_eq!(
        std::env::var("MCP_CHATBOT_CONFIG_TEST_MARKER").as_deref(),
        Ok("from-file")
    );
}

#[test]
fn missing_env_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.env");
    let result = load_env_file(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::EnvFileNotFound { .. })));
}
