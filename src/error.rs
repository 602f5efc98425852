use thiserror::Error;

/// Main error type for the monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Chain access errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Address parsing error: {0}")]
    AddressParsing(String),

    // Emergency path errors
    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    // Metrics gateway errors
    #[error("Metrics push failed: {0}")]
    Metrics(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Still failing after {retries} retries: {source}")]
    RetryExhausted {
        retries: u32,
        #[source]
        source: Box<MonitorError>,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    /// Whether another attempt of the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MonitorError::Rpc(_) | MonitorError::Http(_) | MonitorError::Metrics(_) | MonitorError::Io(_)
        )
    }
}

/// Result type alias for MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Malformed or undersized call results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("short buffer: need {needed} bytes, got {actual}")]
    ShortBuffer { needed: usize, actual: usize },

    #[error("value out of range: {0}")]
    OutOfRange(String),
}
