use super::client::{
    ClientConfig, ClientError, ClientStats, RequestGuard, TransportStats, build_client,
};
use super::transport::{Payload, Transport};
use reqwest::Client;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(String),
}

/// HTTP POST transport. Every `send` becomes a detached task on the runtime
/// the transport was built on; the caller never waits for it.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    stats: Arc<ClientStats>,
    tracker: TaskTracker,
    handle: Handle,
}

impl HttpTransport {
    /// Must be called from inside a tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let handle = Handle::try_current().map_err(|e| ClientError::NoRuntime(e.to_string()))?;
        let client = build_client(&config)?;

        Ok(Self {
            client,
            config,
            stats: Arc::new(ClientStats::default()),
            tracker: TaskTracker::new(),
            handle,
        })
    }

    pub fn stats(&self) -> TransportStats {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Give in-flight sends up to `grace` to finish. Returns false if some
    /// were still running when the grace period ran out; those are abandoned.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        self.tracker.close();
        let finished = tokio::time::timeout(grace, self.tracker.wait()).await.is_ok();
        self.tracker.reopen();

        if !finished {
            warn!(
                "Abandoning {} in-flight analytics batches after {:?}",
                self.tracker.len(),
                grace
            );
        }
        finished
    }

    pub fn build_headers(&self, payload: &Payload) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if payload.gzip {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        headers.insert(
            HeaderName::from_static("x-batch-id"),
            HeaderValue::from_str(&payload.batch_id.to_string())
                .map_err(|e| TransportError::InvalidHeaderValue(format!("Invalid batch ID: {e}")))?,
        );

        headers.insert(
            HeaderName::from_static("x-batch-size"),
            HeaderValue::from_str(&payload.event_count.to_string()).map_err(|e| {
                TransportError::InvalidHeaderValue(format!("Invalid batch size: {e}"))
            })?,
        );

        headers.insert(
            HeaderName::from_static("x-collector-version"),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        Ok(headers)
    }

    async fn post(
        client: Client,
        endpoint: Url,
        headers: HeaderMap,
        payload: Payload,
    ) -> Result<(), TransportError> {
        let response = client
            .post(endpoint)
            .headers(headers)
            .body(payload.body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::HttpError {
                status: status.as_u16(),
            })
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, endpoint: &Url, payload: Payload) {
        let headers = match self.build_headers(&payload) {
            Ok(headers) => headers,
            Err(e) => {
                warn!("Dropping analytics batch {}: {}", payload.batch_id, e);
                return;
            }
        };

        let client = self.client.clone();
        let request = RequestGuard::start(self.stats.clone(), payload.body.len());
        let endpoint = endpoint.clone();
        let batch_id = payload.batch_id;
        let event_count = payload.event_count;
        let bytes = payload.body.len();

        self.tracker.spawn_on(
            async move {
                let start = Instant::now();
                let result = Self::post(client, endpoint, headers, payload).await;
                request.finish(result.is_ok());

                match result {
                    Ok(()) => debug!(
                        "Delivered analytics batch {} ({} events, {} bytes) in {:?}",
                        batch_id,
                        event_count,
                        bytes,
                        start.elapsed()
                    ),
                    Err(e) => warn!(
                        "Analytics batch {} ({} events) lost: {}",
                        batch_id, event_count, e
                    ),
                }
            },
            &self.handle,
        );
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .field("in_flight", &self.tracker.len())
            .finish()
    }
}
