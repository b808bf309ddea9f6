//! Configuration module for the pipeline tracker
//!
//! Provides layered configuration loading from files, environment variables,
//! and defaults.
//!
//! # Configuration Precedence
//!
//! 1. Environment variables (`COMMAND_CENTER_*`)
//! 2. Configuration file (TOML)
//! 3. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use command_center::config::TrackerConfig;
//!
//! // Load defaults
//! let config = TrackerConfig::default();
//! assert_eq!(config.stream.max_retries, 5);
//!
//! // Parse from TOML
//! let toml = r#"
//! [stream]
//! max_retries = 3
//! "#;
//! let config: TrackerConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.stream.max_retries, 3);
//! ```

pub mod error;
pub mod logging;
pub mod pipeline;
pub mod stream;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use stream::StreamConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for one tracker deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// Active domain agents and thereby the graph topology
    pub pipeline: PipelineConfig,
    /// Stream reconnect behavior
    pub stream: StreamConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports COMMAND_CENTER_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("COMMAND_CENTER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("COMMAND_CENTER_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(retries) = std::env::var("COMMAND_CENTER_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                self.stream.max_retries = r;
            }
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.domain_agents.is_empty() {
            return Err(ConfigError::Validation {
                field: "pipeline.domain_agents".to_string(),
                message: "at least one domain agent is required".to_string(),
            });
        }
        for (i, agent) in self.pipeline.domain_agents.iter().enumerate() {
            if !agent.is_domain() {
                return Err(ConfigError::Validation {
                    field: format!("pipeline.domain_agents[{}]", i),
                    message: format!("{} is not a domain agent", agent),
                });
            }
            if self.pipeline.domain_agents[..i].contains(agent) {
                return Err(ConfigError::Validation {
                    field: format!("pipeline.domain_agents[{}]", i),
                    message: format!("duplicate domain agent: {}", agent),
                });
            }
        }
        if self.stream.initial_backoff_ms == 0 {
            return Err(ConfigError::Validation {
                field: "stream.initial_backoff_ms".to_string(),
                message: "backoff must be non-zero".to_string(),
            });
        }
        if self.stream.initial_backoff_ms > self.stream.max_backoff_ms {
            return Err(ConfigError::Validation {
                field: "stream.max_backoff_ms".to_string(),
                message: "ceiling must be at least the initial backoff".to_string(),
            });
        }
        Ok(())
    }
}
