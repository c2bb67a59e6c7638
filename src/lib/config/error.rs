use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment file not found at {path:?}")]
    EnvFileNotFound { path: PathBuf },

    #[error("failed to load environment file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("{name} environment variable is required")]
    MissingVar { name: &'static str },

    #[error("{name} must be an absolute http(s) URL, got '{value}'")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} contains a malformed header entry '{entry}' (expected 'Name: value')")]
    InvalidHeader { name: &'static str, entry: String },
}
