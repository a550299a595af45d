use super::{ConfigError, LogFormat, LogLevel};
use crate::plugin::PluginParams;
use crate::plugin::params::{
    DEFAULT_ANALYTICS_ENDPOINT, DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS, DEFAULT_ANALYTICS_FLUSH_SIZE,
    DEFAULT_DEPLOYMENT_ID, DEFAULT_MAX_BUFFER_SIZE,
};
use crate::sender::ClientConfig;
use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// API key sent with every batch
    #[arg(long, env = "ANALYTICS_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Search index the events belong to
    #[arg(long, env = "ANALYTICS_INDEX_ID", default_value = "")]
    pub index_id: String,

    /// Set to false to turn every hook into a no-op
    #[arg(long, env = "ANALYTICS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub enabled: bool,

    /// Deployment identifier attached to every batch
    #[arg(long, env = "ANALYTICS_DEPLOYMENT_ID", default_value = DEFAULT_DEPLOYMENT_ID)]
    pub deployment_id: String,

    /// Analytics ingestion endpoint URL
    #[arg(long, env = "ANALYTICS_ENDPOINT", default_value = DEFAULT_ANALYTICS_ENDPOINT)]
    pub endpoint: String,

    /// Flush interval in milliseconds
    #[arg(long, env = "FLUSH_INTERVAL_MS", default_value_t = DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS)]
    pub flush_interval_ms: u64,

    /// Number of events that triggers an immediate flush
    #[arg(long, env = "FLUSH_SIZE", default_value_t = DEFAULT_ANALYTICS_FLUSH_SIZE)]
    pub flush_size: usize,

    /// Maximum number of buffered events; the oldest are dropped beyond it
    #[arg(long, env = "MAX_BUFFER_SIZE", default_value_t = DEFAULT_MAX_BUFFER_SIZE)]
    pub max_buffer_size: usize,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Enable gzip compression of batch payloads
    #[arg(long, env = "ENABLE_COMPRESSION")]
    pub enable_compression: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Enable metrics export
    #[arg(long, env = "ENABLE_METRICS")]
    pub enable_metrics: bool,

    /// Metrics export port
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    pub metrics_port: u16,

    /// Grace period for in-flight sends at shutdown, in milliseconds
    #[arg(long, env = "SHUTDOWN_GRACE_MS", default_value = "2000")]
    pub shutdown_grace_ms: u64,

    /// NDJSON search records to replay (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub flush_interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_id: String::new(),
            enabled: true,
            deployment_id: DEFAULT_DEPLOYMENT_ID.to_string(),
            endpoint: DEFAULT_ANALYTICS_ENDPOINT.to_string(),
            flush_interval_ms: DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS,
            flush_size: DEFAULT_ANALYTICS_FLUSH_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            request_timeout_secs: 10,
            enable_compression: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            enable_metrics: false,
            metrics_port: 9090,
            shutdown_grace_ms: 2000,
            input: None,
            config_file: None,
            flush_interval: Duration::from_millis(DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS),
            request_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_millis(2000),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("index_id", &self.index_id)
            .field("enabled", &self.enabled)
            .field("deployment_id", &self.deployment_id)
            .field("endpoint", &self.endpoint)
            .field("flush_interval_ms", &self.flush_interval_ms)
            .field("flush_size", &self.flush_size)
            .field("max_buffer_size", &self.max_buffer_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("enable_compression", &self.enable_compression)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("enable_metrics", &self.enable_metrics)
            .field("metrics_port", &self.metrics_port)
            .field("shutdown_grace_ms", &self.shutdown_grace_ms)
            .field("input", &self.input)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl Config {
    /// Parse CLI args (with env fallbacks). When a config file is named, it
    /// replaces the parsed values wholesale.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);

        if let Some(config_file) = config.config_file.clone() {
            let mut from_file = Self::from_file(&config_file)?;
            if from_file.input.is_none() {
                from_file.input = config.input.take();
            }
            from_file.config_file = Some(config_file);
            return Ok(from_file);
        }

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.flush_interval = Duration::from_millis(self.flush_interval_ms);
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);
        self.shutdown_grace = Duration::from_millis(self.shutdown_grace_ms);
        Ok(())
    }

    pub fn plugin_params(&self) -> PluginParams {
        PluginParams {
            api_key: self.api_key.clone(),
            index_id: self.index_id.clone(),
            enabled: Some(self.enabled),
            deployment_id: Some(self.deployment_id.clone()),
            endpoint: Some(self.endpoint.clone()),
            flush_interval: Some(self.flush_interval_ms),
            flush_size: Some(self.flush_size),
            max_buffer_size: Some(self.max_buffer_size),
            compression: self.enable_compression,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.request_timeout,
            ..ClientConfig::default()
        }
    }

    pub fn metrics_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.metrics_port))
    }
}
