//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// What went wrong while loading or checking a tracker configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("config file is not valid TOML: {0}")]
    Parse(String),

    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
