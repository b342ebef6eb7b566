//! Where the Builder and its message broker live.
//!
//! Every client takes an explicit [`ServerConfig`]. A process-wide default
//! can be set once with [`initialize`] and read back with [`global`]; later
//! calls replace it.

use crate::error::{ClientError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::RwLock};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 32479;
pub const DEFAULT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "wise";

/// MQTT broker the Builder publishes job status to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_BROKER_PORT,
            topic: DEFAULT_TOPIC.to_string(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub broker: BrokerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            broker: BrokerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// `host:port` of the Builder.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn from_json(text: &str) -> Result<ServerConfig> {
        serde_json::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<ServerConfig> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        let config = ServerConfig::from_json(&text)?;
        debug!("Loaded Builder endpoint {} from {}", config.address(), path.display());
        Ok(config)
    }
}

static GLOBAL: RwLock<Option<ServerConfig>> = RwLock::new(None);

/// Replace the process-wide default endpoint.
pub fn initialize(config: ServerConfig) {
    let mut global = GLOBAL.write().unwrap_or_else(|e| e.into_inner());
    *global = Some(config);
}

/// The process-wide default endpoint, or the built-in defaults when
/// [`initialize`] was never called.
pub fn global() -> ServerConfig {
    let global = GLOBAL.read().unwrap_or_else(|e| e.into_inner());
    global.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:32479");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.topic, "wise");
    }

    #[test]
    fn test_partial_json() {
        let config =
            ServerConfig::from_json(r#"{"host": "builder.local", "broker": {"topic": "fires"}}"#)
                .unwrap();
        assert_eq!(config.address(), "builder.local:32479");
        assert_eq!(config.broker.topic, "fires");
        assert_eq!(config.broker.host, "127.0.0.1");
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            ServerConfig::from_json("{\"port\": \"high\"}"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let missing = std::env::temp_dir().join("wise-client-no-such-config.json");
        assert!(matches!(
            ServerConfig::from_json_file(missing),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_global_last_write_wins() {
        initialize(ServerConfig::new("first", 1));
        initialize(ServerConfig::new("second", 2));
        assert_eq!(global().address(), "second:2");
    }
}
