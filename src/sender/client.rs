use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            max_connections: 4,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: format!("rask-search-analytics/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub bytes_sent: u64,
    pub in_flight: u64,
}

#[derive(Debug, Default)]
pub struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    bytes_sent: AtomicU64,
    in_flight: AtomicU64,
}

impl ClientStats {
    pub fn request_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self, success: bool, bytes: usize) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
            self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> TransportStats {
        TransportStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

/// One request counted in `in_flight`. If it is dropped without `finish`,
/// for instance because its task never ran, it is recorded as a failure.
#[derive(Debug)]
pub struct RequestGuard {
    stats: Arc<ClientStats>,
    bytes: usize,
    finished: bool,
}

impl RequestGuard {
    pub fn start(stats: Arc<ClientStats>, bytes: usize) -> Self {
        stats.request_started();
        Self {
            stats,
            bytes,
            finished: false,
        }
    }

    pub fn finish(mut self, success: bool) {
        self.finished = true;
        self.stats.record_request(success, self.bytes);
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.stats.record_request(false, self.bytes);
        }
    }
}

pub(crate) fn build_client(config: &ClientConfig) -> Result<Client, ClientError> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connection_timeout)
        .pool_max_idle_per_host(config.max_connections)
        .pool_idle_timeout(config.keep_alive_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ClientError::InvalidConfiguration(format!("Failed to build HTTP client: {e}")))
}
