//! Configuration for the Prometheus exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use zwave_common::config::{LoggingConfig, MqttConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("One or more required settings are not set: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// MQTT broker settings.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9000").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    "0.0.0.0:9000".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

/// Settings supplied on the command line or through the environment.
/// `Some` values replace what the config file says.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub broker: Option<String>,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub listen: Option<String>,
    pub log_level: Option<String>,
}

impl ExporterConfig {
    /// Read a JSON5 configuration file.
    ///
    /// Not validated: overrides may still fill required settings, so callers
    /// run [`ExporterConfig::validate`] once everything is applied.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string, without validating it.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(json5::from_str(content)?)
    }

    /// Apply command-line and environment overrides.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(broker) = overrides.broker {
            self.mqtt.broker = broker;
        }
        if let Some(client_id) = overrides.client_id {
            self.mqtt.client_id = client_id;
        }
        if let Some(username) = overrides.username {
            self.mqtt.username = username;
        }
        if let Some(password) = overrides.password {
            self.mqtt.password = password;
        }
        if let Some(listen) = overrides.listen {
            self.prometheus.listen = listen;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.mqtt.missing_settings();
        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings(missing));
        }

        self.mqtt
            .broker_address()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.mqtt.topic.is_empty() {
            return Err(ConfigError::Validation(
                "MQTT topic must not be empty".to_string(),
            ));
        }

        // The MQTT client rejects shorter keep-alive intervals.
        if self.mqtt.keep_alive_secs < 5 {
            return Err(ConfigError::Validation(
                "keep_alive_secs must be >= 5".to_string(),
            ));
        }

        if self.mqtt.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.mqtt.subscribe_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "subscribe_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.mqtt.disconnect_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "disconnect_timeout_ms must be > 0".to_string(),
            ));
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        // Validate path starts with /
        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        Ok(())
    }
}
