pub mod config;
pub mod initialization;
pub mod logging_system;
pub mod replay;
pub mod shutdown;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use initialization::InitializationError;
pub use logging_system::{LoggingSystem, setup_logging_safe};
pub use replay::{ReplayStats, SearchRecord, replay};

use crate::domain::AnalyticsError;
use crate::plugin::AnalyticsPlugin;
use crate::sender::HttpTransport;
use std::process;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Replay host: reads search records, drives the analytics plugin and
/// delivers its batches over HTTP.
pub struct App {
    config: Config,
    plugin: Arc<AnalyticsPlugin>,
    transport: HttpTransport,
    shutdown: CancellationToken,
}

impl App {
    pub async fn from_args<I, T>(args: I) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;
        Ok(Self::from_config(config).await?)
    }

    pub async fn from_config(config: Config) -> Result<Self, AnalyticsError> {
        if let Err(e) = setup_logging_safe(config.log_level, config.log_format) {
            eprintln!("Warning: {e}");
        }

        let transport = HttpTransport::new(config.client_config())
            .map_err(|e| AnalyticsError::Startup(e.to_string()))?;
        let plugin = AnalyticsPlugin::new(config.plugin_params(), Arc::new(transport.clone()))?;

        info!("Starting rask-search-analytics v{}", crate::VERSION);
        info!(
            "Configuration: enabled={}, index_id={}, endpoint={}, flush_size={}, flush_interval={:?}",
            plugin.is_enabled(),
            config.index_id,
            config.endpoint,
            config.flush_size,
            config.flush_interval
        );

        Ok(Self {
            config,
            plugin: Arc::new(plugin),
            transport,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn plugin(&self) -> &Arc<AnalyticsPlugin> {
        &self.plugin
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Cancelling this token stops the replay as if a signal had arrived.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self) -> Result<ReplayStats, AnalyticsError> {
        let signals = shutdown::spawn_signal_handler(self.shutdown.clone());
        let metrics_server = self.start_metrics_server()?;

        let replayed = self.replay_input().await;

        // Final flush happens even if reading failed midway
        self.plugin.close_all();
        if !self.transport.wait_idle(self.config.shutdown_grace).await {
            warn!("Shutdown grace period elapsed with sends still in flight");
        }

        self.shutdown.cancel();
        if let Err(e) = signals.await {
            warn!("Signal handler task failed: {}", e);
        }
        if let Some(server) = metrics_server {
            server.abort();
        }

        let stats = replayed?;
        let transport_stats = self.transport.stats();
        info!(
            "Replayed {} search records for {} engines ({} malformed); {} batches delivered, {} failed",
            stats.records,
            stats.engines,
            stats.malformed,
            transport_stats.successful_requests,
            transport_stats.failed_requests
        );

        Ok(stats)
    }

    async fn replay_input(&self) -> std::io::Result<ReplayStats> {
        match &self.config.input {
            Some(path) => {
                let file = tokio::fs::File::open(path).await?;
                replay(BufReader::new(file), self.plugin.as_ref(), &self.shutdown).await
            }
            None => {
                replay(
                    BufReader::new(tokio::io::stdin()),
                    self.plugin.as_ref(),
                    &self.shutdown,
                )
                .await
            }
        }
    }

    #[cfg(feature = "metrics")]
    fn start_metrics_server(&self) -> Result<Option<tokio::task::JoinHandle<()>>, AnalyticsError> {
        if !self.config.enable_metrics {
            return Ok(None);
        }

        let exporter = crate::metrics::prometheus::PrometheusExporter::new(
            self.plugin.clone(),
            Some(self.transport.clone()),
        )
        .map_err(|e| AnalyticsError::Startup(e.to_string()))?;

        Ok(Some(tokio::spawn(exporter.serve(self.config.metrics_addr()))))
    }

    #[cfg(not(feature = "metrics"))]
    fn start_metrics_server(&self) -> Result<Option<tokio::task::JoinHandle<()>>, AnalyticsError> {
        if self.config.enable_metrics {
            warn!("Metrics feature is disabled");
        }
        Ok(None)
    }
}

pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = match App::from_args(std::env::args()).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(2);
        }
    };

    if let Err(e) = app.run().await {
        error!("Application error: {}", e);
        process::exit(1);
    }

    Ok(())
}
