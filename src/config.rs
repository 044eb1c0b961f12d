use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::SearchError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub db: DbConfig,
    pub server: ServerConfig,
    pub content: ContentConfig,
}

/// Connection parameters for the search engine. All of `host`, `port`,
/// `protocol`, and `api_key` are required; the subsystem refuses to start
/// without them.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub api_key: String,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    2
}

impl EngineConfig {
    /// Check that every required connection parameter is present.
    pub fn validate(&self) -> std::result::Result<(), SearchError> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("engine.host");
        }
        if self.protocol.trim().is_empty() {
            missing.push("engine.protocol");
        }
        if self.api_key.trim().is_empty() {
            missing.push("engine.api_key");
        }
        if self.port == 0 {
            missing.push("engine.port");
        }
        if !missing.is_empty() {
            return Err(SearchError::Configuration(format!(
                "missing required search engine parameters: {}",
                missing.join(", ")
            )));
        }
        match self.protocol.as_str() {
            "http" | "https" => Ok(()),
            other => Err(SearchError::Configuration(format!(
                "engine.protocol must be http or https, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

impl ServerConfig {
    /// Whether error responses should omit diagnostic detail.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Location of the bundled learning-content document.
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    pub learning_content_path: PathBuf,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Missing engine parameters are a fatal startup error
    config.engine.validate()?;

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    match config.server.environment.as_str() {
        "development" | "production" => {}
        other => anyhow::bail!(
            "Unknown environment: '{}'. Must be development or production.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_config() -> EngineConfig {
        EngineConfig {
            host: "localhost".to_string(),
            port: 8108,
            protocol: "http".to_string(),
            api_key: "xyz".to_string(),
            connection_timeout_secs: 2,
        }
    }

    #[test]
    fn test_valid_engine_config() {
        assert!(engine_config().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let mut cfg = engine_config();
        cfg.api_key = "".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("engine.api_key"));
    }

    #[test]
    fn test_missing_host_and_port_listed_together() {
        let mut cfg = engine_config();
        cfg.host = "  ".to_string();
        cfg.port = 0;
        let err = cfg.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("engine.host"));
        assert!(msg.contains("engine.port"));
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let mut cfg = engine_config();
        cfg.protocol = "ftp".to_string();
        assert!(cfg.validate().is_err());
    }
}
