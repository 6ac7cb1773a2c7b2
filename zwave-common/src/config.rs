use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::topic::all_topics_wildcard;

/// Port used when the broker address does not carry one.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// MQTT broker connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker address: `tcp://host:port`, `mqtt://host:port`, `host:port` or `host`.
    #[serde(default)]
    pub broker: String,

    /// MQTT client identifier. Must be stable for the persistent session to survive.
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Topic filter to subscribe to.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Keep-alive interval (seconds).
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// How long to wait for the broker to accept the connection (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long to wait for the subscription acknowledgement (seconds).
    #[serde(default = "default_subscribe_timeout")]
    pub subscribe_timeout_secs: u64,

    /// Upper bound on the graceful disconnect (milliseconds).
    #[serde(default = "default_disconnect_timeout")]
    pub disconnect_timeout_ms: u64,

    /// Pause between reconnection attempts once the session was established (seconds).
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

fn default_topic() -> String {
    all_topics_wildcard()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_subscribe_timeout() -> u64 {
    5
}

fn default_disconnect_timeout() -> u64 {
    250
}

fn default_reconnect_delay() -> u64 {
    2
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: String::new(),
            client_id: String::new(),
            username: String::new(),
            password: String::new(),
            topic: default_topic(),
            keep_alive_secs: default_keep_alive(),
            connect_timeout_secs: default_connect_timeout(),
            subscribe_timeout_secs: default_subscribe_timeout(),
            disconnect_timeout_ms: default_disconnect_timeout(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

impl MqttConfig {
    /// Names of the required broker settings that are empty, using their
    /// environment variable names.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("MOSQUITTO_BROKER", &self.broker),
            ("MOSQUITTO_CLIENT_ID", &self.client_id),
            ("MOSQUITTO_USERNAME", &self.username),
            ("MOSQUITTO_PASSWORD", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Parse the configured broker address.
    pub fn broker_address(&self) -> Result<BrokerAddress> {
        BrokerAddress::parse(&self.broker)
    }
}

/// Host and port of an MQTT broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl BrokerAddress {
    /// Parse a broker address.
    ///
    /// # Example
    /// ```
    /// use zwave_common::config::BrokerAddress;
    ///
    /// let addr = BrokerAddress::parse("tcp://mosquitto:1883").unwrap();
    /// assert_eq!(addr.host, "mosquitto");
    /// assert_eq!(addr.port, 1883);
    /// ```
    pub fn parse(address: &str) -> Result<Self> {
        let trimmed = address.trim();
        let without_scheme = match trimmed.split_once("://") {
            Some(("tcp" | "mqtt", rest)) => rest,
            Some((scheme, _)) => {
                return Err(Error::BrokerAddress(format!(
                    "unsupported scheme '{}' in '{}'",
                    scheme, address
                )));
            }
            None => trimmed,
        };
        let without_path = without_scheme.trim_end_matches('/');

        let (host, port) = match without_path.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    Error::BrokerAddress(format!("invalid port '{}' in '{}'", port, address))
                })?;
                (host, port)
            }
            None => (without_path, DEFAULT_MQTT_PORT),
        };

        if host.is_empty() || host.contains('/') {
            return Err(Error::BrokerAddress(format!(
                "missing host in '{}'",
                address
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl std::fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Common logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
