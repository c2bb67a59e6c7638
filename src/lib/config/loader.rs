use super::error::ConfigError;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::debug;

/// Default environment file, resolved against the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

static ENV_LOADER: Once = Once::new();

/// Source of configuration variables.
///
/// The process environment is the production source; tests hand in a map.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.to_string())
    }
}

/// Trimmed value, with blank treated as unset
pub(crate) fn optional(source: &impl EnvSource, name: &str) -> Option<String> {
    source
        .var(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn required(source: &impl EnvSource, name: &'static str) -> Result<String, ConfigError> {
    optional(source, name).ok_or(ConfigError::MissingVar { name })
}

pub(crate) fn optional_u64(
    source: &impl EnvSource,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match optional(source, name) {
        None => Ok(None),
        Some(value) => match value.parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
            _ => Err(ConfigError::InvalidNumber { name, value }),
        },
    }
}

pub(crate) fn require_http_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    match reqwest::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(ConfigError::InvalidUrl { name, value }),
    }
}

/// Load variables from an env file into the process environment.
///
/// Without an explicit path the default `.env` is loaded once, and its
/// absence is not an error. An explicit path must exist. Variables already
/// set in the environment win over the file.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::EnvFileNotFound {
                    path: path.to_path_buf(),
                });
            }
            dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "Loaded environment file");
            Ok(Some(path.to_path_buf()))
        }
        None => {
            let mut loaded = None;
            ENV_LOADER.call_once(|| {
                loaded = dotenvy::from_filename(DEFAULT_ENV_FILE).ok();
            });
            if let Some(path) = &loaded {
                debug!(path = %path.display(), "Loaded default environment file");
            }
            Ok(loaded)
        }
    }
}
