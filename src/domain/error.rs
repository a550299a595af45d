use thiserror::Error;

/// Invalid plugin or collector configuration. Always raised at construction
/// time, before any event can be observed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} for search analytics plugin")]
    MissingField(&'static str),

    #[error("Invalid endpoint URL '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error type for the analytics host.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Replay failed: {0}")]
    Replay(#[from] std::io::Error),
}
