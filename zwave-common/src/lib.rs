//! Z-Wave Common Library
//!
//! Shared types and utilities for exporters consuming Z-Wave JS over MQTT:
//!
//! - [`topic`] - Topic namespace and classification
//! - [`payload`] - Value payload decoding
//! - [`reading`] - Sensor and meter reading kinds
//! - [`config`] - MQTT and logging configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod payload;
pub mod reading;
pub mod topic;

// Re-export commonly used types at the crate root
pub use config::{BrokerAddress, LogFormat, LoggingConfig, MqttConfig};
pub use error::{Error, Result};
pub use payload::{
    DecodeError, FloatReading, IntegerReading, PayloadShape, Reading, decode_float,
    decode_integer, decode_value,
};
pub use reading::{MeterKind, SensorKind, current_timestamp_secs, endpoint_label};
pub use topic::{
    ParsedTopic, TOPIC_PREFIX, TopicBuilder, TopicKind, all_topics_wildcard, classify_topic,
};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG`, when set, takes precedence over `config.level`.
///
/// # Example
///
/// ```ignore
/// use zwave_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},rumqttc=warn", config.level)));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    tracing::debug!(level = %config.level, format = ?config.format, "Tracing initialized");
    Ok(())
}
