use thiserror::Error;

/// Common error type for the Z-Wave exporter components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid broker address: {0}")]
    BrokerAddress(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
