//! The batching collector: buffers search events and hands batches to a
//! [`Transport`] on size, time and shutdown triggers.

pub mod config;
pub mod scheduler;

pub use config::CollectorConfig;
pub use scheduler::{FlushGuard, FlushScheduler, SchedulerState};

use crate::buffer::{Batch, BatchType, BufferError, CollectorIdentity, EventQueue};
use crate::domain::{ConfigError, SearchEvent};
use crate::metrics::{CollectorMetrics, CollectorMetricsSnapshot};
use crate::sender::{BatchSerializer, Transport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

/// Search-analytics collector bound to one engine instance.
///
/// `add` is safe to call from the search path: it never blocks on I/O and
/// never fails. Flushing serializes the drained batch and dispatches it to
/// the transport without waiting for the outcome.
///
/// The flush timer runs until [`close`](Self::close) is called or the
/// collector is dropped; both perform one final flush.
pub struct Collector {
    inner: Arc<CollectorInner>,
    cancel: CancellationToken,
}

struct CollectorInner {
    config: CollectorConfig,
    queue: EventQueue,
    scheduler: FlushScheduler,
    serializer: BatchSerializer,
    transport: Arc<dyn Transport>,
    metrics: CollectorMetrics,
    closed: AtomicBool,
}

impl Collector {
    /// Validate `config`, build the collector and arm its flush timer.
    ///
    /// Must be called from inside a tokio runtime; the timer runs on it.
    pub fn create(
        config: CollectorConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, CollectorError> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|e| CollectorError::NoRuntime(e.to_string()))?;

        let inner = Arc::new(CollectorInner {
            queue: EventQueue::new(config.max_buffer_size)?,
            scheduler: FlushScheduler::new(config.flush_size),
            serializer: BatchSerializer::new(config.compression),
            transport,
            metrics: CollectorMetrics::new(),
            closed: AtomicBool::new(false),
            config,
        });

        let period = inner.config.flush_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let cancel = CancellationToken::new();
        handle.spawn(run_timer(inner.clone(), ticker, cancel.clone()));

        info!(
            "Search analytics collector {} armed (index={}, flush_size={}, flush_interval={:?})",
            inner.config.identity.collector_id,
            inner.config.identity.index_id,
            inner.config.flush_size,
            period
        );

        Ok(Self { inner, cancel })
    }

    /// Queue one event. Triggers a flush when the queue reaches `flush_size`.
    pub fn add(&self, event: SearchEvent) {
        let inner = &self.inner;

        if inner.closed.load(Ordering::Acquire) {
            let dropped = inner.metrics.record_dropped(1);
            debug!("Collector closed, dropping search event ({} dropped so far)", dropped);
            return;
        }

        let outcome = inner.queue.enqueue(event);
        inner.metrics.record_added();

        if outcome.dropped.is_some() {
            let dropped = inner.metrics.record_dropped(1);
            if dropped.is_power_of_two() {
                warn!(
                    "Analytics buffer full ({} events), {} oldest events dropped so far",
                    inner.queue.capacity(),
                    dropped
                );
            }
        }

        if inner.scheduler.should_flush(outcome.len) {
            inner.flush(BatchType::SizeBased);
        }
    }

    /// Cancel the timer and flush whatever is queued. Later calls do nothing.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.cancel.cancel();
        self.inner.flush(BatchType::Shutdown);

        info!(
            "Search analytics collector {} closed",
            self.inner.config.identity.collector_id
        );
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.scheduler.state()
    }

    pub fn identity(&self) -> &CollectorIdentity {
        &self.inner.config.identity
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> CollectorMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("config", &self.inner.config)
            .field("pending", &self.inner.queue.len())
            .field("state", &self.inner.scheduler.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl CollectorInner {
    fn flush(&self, batch_type: BatchType) {
        let _guard = match batch_type {
            BatchType::Shutdown => self.scheduler.begin(),
            _ => match self.scheduler.try_begin() {
                Some(guard) => guard,
                None => {
                    self.metrics.record_skipped_flush();
                    debug!("Flush already in progress, skipping {} trigger", batch_type.as_str());
                    return;
                }
            },
        };

        let events = self.queue.drain();
        if events.is_empty() {
            return;
        }

        let event_count = events.len();
        let batch = Batch::new(self.config.identity.clone(), events, batch_type);

        match self.serializer.serialize(&batch) {
            Ok(payload) => {
                debug!(
                    "Flushing analytics batch {} ({} events, {} bytes, trigger={})",
                    payload.batch_id,
                    event_count,
                    payload.body.len(),
                    batch_type.as_str()
                );
                self.transport.send(&self.config.endpoint, payload);
                self.metrics.record_flush(batch_type, event_count);
            }
            Err(e) => {
                self.metrics.record_serialization_failure();
                warn!(
                    "Failed to serialize analytics batch {} ({} events lost): {}",
                    batch.id(),
                    event_count,
                    e
                );
            }
        }
    }
}

async fn run_timer(inner: Arc<CollectorInner>, mut ticker: Interval, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = inner.scheduler.rearmed() => ticker.reset(),
            _ = ticker.tick() => {
                if !inner.queue.is_empty() {
                    inner.flush(BatchType::TimeBased);
                }
            }
        }
    }

    debug!(
        "Flush timer for collector {} stopped",
        inner.config.identity.collector_id
    );
}
