use crate::plugin::AnalyticsPlugin;
use crate::sender::HttpTransport;
use parking_lot::Mutex;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use warp::{Filter, Reply};

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    PrometheusError(#[from] prometheus::Error),
    #[error("Metrics encoding error: {0}")]
    EncodingError(String),
}

/// Prometheus view over the plugin's collectors and the HTTP transport.
///
/// Counters live in the collectors themselves; every scrape rebuilds the
/// registry's values from fresh snapshots, so replaced or closed collectors
/// simply disappear from the output. Scrapes are serialized so a concurrent
/// reset never leaks into another scrape's output.
#[derive(Clone)]
pub struct PrometheusExporter {
    registry: Registry,
    events: IntCounterVec,
    flushes: IntCounterVec,
    skipped_flushes: IntCounterVec,
    serialization_failures: IntCounterVec,
    requests: IntCounterVec,
    bytes_sent: IntCounter,
    in_flight: IntGauge,
    plugin: Arc<AnalyticsPlugin>,
    transport: Option<HttpTransport>,
    scrape: Arc<Mutex<()>>,
}

impl PrometheusExporter {
    pub fn new(
        plugin: Arc<AnalyticsPlugin>,
        transport: Option<HttpTransport>,
    ) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let events = IntCounterVec::new(
            Opts::new(
                "rask_search_analytics_events_total",
                "Search events seen by each collector",
            ),
            &["collector_id", "outcome"], // added, dropped, flushed
        )?;
        registry.register(Box::new(events.clone()))?;

        let flushes = IntCounterVec::new(
            Opts::new(
                "rask_search_analytics_flushes_total",
                "Batches flushed by each collector",
            ),
            &["collector_id", "trigger"],
        )?;
        registry.register(Box::new(flushes.clone()))?;

        let skipped_flushes = IntCounterVec::new(
            Opts::new(
                "rask_search_analytics_skipped_flushes_total",
                "Flush triggers that fired while a flush was in progress",
            ),
            &["collector_id"],
        )?;
        registry.register(Box::new(skipped_flushes.clone()))?;

        let serialization_failures = IntCounterVec::new(
            Opts::new(
                "rask_search_analytics_serialization_failures_total",
                "Batches lost to serialization errors",
            ),
            &["collector_id"],
        )?;
        registry.register(Box::new(serialization_failures.clone()))?;

        let requests = IntCounterVec::new(
            Opts::new(
                "rask_search_analytics_requests_total",
                "Batch delivery requests by outcome",
            ),
            &["status"], // success, failure
        )?;
        registry.register(Box::new(requests.clone()))?;

        let bytes_sent = IntCounter::new(
            "rask_search_analytics_bytes_sent_total",
            "Payload bytes delivered successfully",
        )?;
        registry.register(Box::new(bytes_sent.clone()))?;

        let in_flight = IntGauge::new(
            "rask_search_analytics_requests_in_flight",
            "Batch delivery requests not yet completed",
        )?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            events,
            flushes,
            skipped_flushes,
            serialization_failures,
            requests,
            bytes_sent,
            in_flight,
            plugin,
            transport,
            scrape: Arc::new(Mutex::new(())),
        })
    }

    fn refresh(&self) {
        self.events.reset();
        self.flushes.reset();
        self.skipped_flushes.reset();
        self.serialization_failures.reset();

        for (collector_id, snapshot) in self.plugin.metrics() {
            let id = collector_id.as_str();
            self.events
                .with_label_values(&[id, "added"])
                .inc_by(snapshot.events_added);
            self.events
                .with_label_values(&[id, "dropped"])
                .inc_by(snapshot.events_dropped);
            self.events
                .with_label_values(&[id, "flushed"])
                .inc_by(snapshot.events_flushed);

            self.flushes
                .with_label_values(&[id, "size"])
                .inc_by(snapshot.size_flushes);
            self.flushes
                .with_label_values(&[id, "time"])
                .inc_by(snapshot.time_flushes);
            self.flushes
                .with_label_values(&[id, "shutdown"])
                .inc_by(snapshot.shutdown_flushes);

            self.skipped_flushes
                .with_label_values(&[id])
                .inc_by(snapshot.skipped_flushes);
            self.serialization_failures
                .with_label_values(&[id])
                .inc_by(snapshot.serialization_failures);
        }

        if let Some(transport) = &self.transport {
            let stats = transport.stats();
            self.requests.reset();
            self.requests
                .with_label_values(&["success"])
                .inc_by(stats.successful_requests);
            self.requests
                .with_label_values(&["failure"])
                .inc_by(stats.failed_requests);

            self.bytes_sent.reset();
            self.bytes_sent.inc_by(stats.bytes_sent);

            self.in_flight
                .set(i64::try_from(stats.in_flight).unwrap_or(i64::MAX));
        }
    }

    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let metric_families = {
            let _scrape = self.scrape.lock();
            self.refresh();
            self.registry.gather()
        };

        let encoder = TextEncoder::new();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }

    /// Serve `/metrics` and `/health` until the future is dropped.
    pub async fn serve(self, addr: SocketAddr) {
        let exporter = self;

        let metrics = warp::path!("metrics")
            .and(warp::get())
            .map(move || match exporter.export_metrics() {
                Ok(metrics_text) => warp::reply::with_header(
                    metrics_text,
                    "content-type",
                    "text/plain; version=0.0.4",
                )
                .into_response(),
                Err(e) => {
                    tracing::warn!("Failed to export metrics: {}", e);
                    warp::reply::with_status(
                        "Internal Server Error",
                        warp::http::StatusCode::INTERNAL_SERVER_ERROR,
                    )
                    .into_response()
                }
            });

        let health = warp::path!("health").and(warp::get()).map(|| "OK");

        let routes = metrics.or(health);

        tracing::info!("Starting Prometheus metrics server on {}", addr);

        warp::serve(routes).run(addr).await;
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter")
            .field("plugin", &self.plugin)
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngineInstance, SearchResults};
    use crate::plugin::{PluginParams, SearchPlugin};
    use crate::sender::NullTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_export_includes_per_collector_counters() {
        let plugin = Arc::new(
            AnalyticsPlugin::new(PluginParams::new("key", "docs"), Arc::new(NullTransport)).unwrap(),
        );
        let engine = EngineInstance::new("engine-a");
        plugin.after_create(&engine);
        plugin.after_search(&engine, &json!({"term": "rust"}), None, &SearchResults::default());

        let exporter = PrometheusExporter::new(plugin.clone(), None).unwrap();
        let text = exporter.export_metrics().unwrap();

        assert!(text.contains(
            r#"rask_search_analytics_events_total{collector_id="engine-a",outcome="added"} 1"#
        ));
        assert!(text.contains("rask_search_analytics_flushes_total"));

        // Scraping twice must not double-count
        let text = exporter.export_metrics().unwrap();
        assert!(text.contains(
            r#"rask_search_analytics_events_total{collector_id="engine-a",outcome="added"} 1"#
        ));
    }

    #[tokio::test]
    async fn test_closed_collectors_disappear() {
        let plugin = Arc::new(
            AnalyticsPlugin::new(PluginParams::new("key", "docs"), Arc::new(NullTransport)).unwrap(),
        );
        plugin.after_create(&EngineInstance::new("engine-a"));

        let exporter = PrometheusExporter::new(plugin.clone(), None).unwrap();
        assert!(exporter.export_metrics().unwrap().contains("engine-a"));

        plugin.close_all();
        assert!(!exporter.export_metrics().unwrap().contains("engine-a"));
    }

    #[tokio::test]
    async fn test_concurrent_scrapes_report_consistent_counts() {
        let plugin = Arc::new(
            AnalyticsPlugin::new(PluginParams::new("key", "docs"), Arc::new(NullTransport)).unwrap(),
        );
        let engine = EngineInstance::new("engine-a");
        plugin.after_create(&engine);
        for i in 0..5 {
            plugin.after_search(
                &engine,
                &json!({ "term": format!("q{i}") }),
                None,
                &SearchResults::default(),
            );
        }

        let exporter = PrometheusExporter::new(plugin.clone(), None).unwrap();
        let expected =
            r#"rask_search_analytics_events_total{collector_id="engine-a",outcome="added"} 5"#;

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let exporter = exporter.clone();
                scope.spawn(move || {
                    for _ in 0..500 {
                        let text = exporter.export_metrics().unwrap();
                        assert!(text.contains(expected), "inconsistent scrape:\n{text}");
                    }
                });
            }
        });
    }
}
