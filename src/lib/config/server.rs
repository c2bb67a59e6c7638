use super::error::ConfigError;
use super::loader::{EnvSource, ProcessEnv, optional, require_http_url};
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const NAME_VAR: &str = "MCP_SERVER_NAME";
pub const URL_VAR: &str = "MCP_SERVER_URL";
pub const LEGACY_URL_VAR: &str = "TABLEAU_MCP_URL";
pub const HEADERS_VAR: &str = "MCP_SERVER_HEADERS";
pub const COMMAND_VAR: &str = "MCP_SERVER_COMMAND";
pub const ARGS_VAR: &str = "MCP_SERVER_ARGS";
pub const WORKDIR_VAR: &str = "MCP_SERVER_WORKDIR";
pub const ENV_PREFIX: &str = "MCP_SERVER_ENV_";

pub const DEFAULT_SERVER_NAME: &str = "mcp-server";
pub const DEFAULT_COMMAND: &str = "npx";
pub const DEFAULT_ARGS: &str = "-y @tableau/mcp-server@latest";

/// Variables forwarded to the Tableau MCP server under their unprefixed names
const TABLEAU_FORWARDED: &[(&str, &str)] = &[
    ("TABLEAU_SERVER", "SERVER"),
    ("TABLEAU_SITE_NAME", "SITE_NAME"),
    ("TABLEAU_AUTH", "AUTH"),
    ("TABLEAU_PAT_NAME", "PAT_NAME"),
    ("TABLEAU_PAT_VALUE", "PAT_VALUE"),
    ("TABLEAU_JWT_SUB_CLAIM", "JWT_SUB_CLAIM"),
    ("TABLEAU_CONNECTED_APP_CLIENT_ID", "CONNECTED_APP_CLIENT_ID"),
    ("TABLEAU_CONNECTED_APP_SECRET_ID", "CONNECTED_APP_SECRET_ID"),
    ("TABLEAU_CONNECTED_APP_SECRET_VALUE", "CONNECTED_APP_SECRET_VALUE"),
];

/// Names of `MCP_SERVER_ENV_*` pass-through keys; an env source cannot be
/// enumerated, so these are looked up explicitly.
pub const PASSTHROUGH_KEYS_VAR: &str = "MCP_SERVER_ENV_KEYS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Spawn the server as a subprocess and talk over stdin/stdout
    Stdio,
    /// Connect to a streamable HTTP endpoint
    Http,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "HTTP",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subprocess tool-provider settings
#[derive(Clone, PartialEq, Eq)]
pub struct StdioServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl StdioServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            workdir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self, ConfigError> {
        let command = optional(source, COMMAND_VAR).unwrap_or_else(|| DEFAULT_COMMAND.to_string());
        let args = optional(source, ARGS_VAR).unwrap_or_else(|| DEFAULT_ARGS.to_string());

        let mut env = BTreeMap::new();
        env.insert("TRANSPORT".to_string(), "stdio".to_string());
        for (from, to) in TABLEAU_FORWARDED {
            if let Some(value) = optional(source, from) {
                env.insert(to.to_string(), value);
            }
        }
        env.insert("EXCLUDE_TOOLS".to_string(), String::new());

        if let Some(keys) = optional(source, PASSTHROUGH_KEYS_VAR) {
            for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                if let Some(value) = source.var(&format!("{ENV_PREFIX}{key}")) {
                    env.insert(key.to_string(), value);
                }
            }
        }

        Ok(Self {
            name: optional(source, NAME_VAR).unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            command: PathBuf::from(expand(&command)),
            args: args.split_whitespace().map(expand).collect(),
            env,
            workdir: optional(source, WORKDIR_VAR).map(|dir| PathBuf::from(expand(&dir))),
        })
    }
}

impl fmt::Debug for StdioServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdioServerConfig")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("workdir", &self.workdir)
            .finish()
    }
}

/// Streamable HTTP tool-provider settings
#[derive(Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    pub name: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl HttpServerConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self, ConfigError> {
        let (name, url) = match optional(source, URL_VAR) {
            Some(url) => (URL_VAR, url),
            None => match optional(source, LEGACY_URL_VAR) {
                Some(url) => (LEGACY_URL_VAR, url),
                None => return Err(ConfigError::MissingVar { name: URL_VAR }),
            },
        };
        let url = require_http_url(name, url)?;

        let mut headers = BTreeMap::new();
        if let Some(raw) = optional(source, HEADERS_VAR) {
            for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
                let (key, value) =
                    entry
                        .split_once(':')
                        .ok_or_else(|| ConfigError::InvalidHeader {
                            name: HEADERS_VAR,
                            entry: entry.to_string(),
                        })?;
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Ok(Self {
            name: optional(source, NAME_VAR).unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            url,
            headers,
        })
    }
}

impl fmt::Debug for HttpServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServerConfig")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Where the tool provider lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    Stdio(StdioServerConfig),
    Http(HttpServerConfig),
}

impl ServerTarget {
    pub fn from_env(kind: TransportKind) -> Result<Self, ConfigError> {
        Self::from_source(kind, &ProcessEnv)
    }

    pub fn from_source(kind: TransportKind, source: &impl EnvSource) -> Result<Self, ConfigError> {
        match kind {
            TransportKind::Stdio => StdioServerConfig::from_source(source).map(ServerTarget::Stdio),
            TransportKind::Http => HttpServerConfig::from_source(source).map(ServerTarget::Http),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            ServerTarget::Stdio(_) => TransportKind::Stdio,
            ServerTarget::Http(_) => TransportKind::Http,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ServerTarget::Stdio(config) => &config.name,
            ServerTarget::Http(config) => &config.name,
        }
    }
}

fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
