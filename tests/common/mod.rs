#![allow(dead_code)]

use parking_lot::Mutex;
use rask_search_analytics::buffer::{Batch, CollectorIdentity};
use rask_search_analytics::collector::CollectorConfig;
use rask_search_analytics::domain::{SearchEvent, SearchResults};
use rask_search_analytics::sender::{BatchSerializer, Payload, Transport};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Keeps every payload it is handed, decoded back into batches.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(Url, Payload)>>,
}

impl Transport for RecordingTransport {
    fn send(&self, endpoint: &Url, payload: Payload) {
        self.sent.lock().push((endpoint.clone(), payload));
    }
}

impl RecordingTransport {
    pub fn batch_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn endpoints(&self) -> Vec<Url> {
        self.sent.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.sent
            .lock()
            .iter()
            .map(|(_, payload)| BatchSerializer::decode(&payload.body, payload.gzip).unwrap())
            .collect()
    }

    /// Raw search strings, one inner vec per batch.
    pub fn terms(&self) -> Vec<Vec<String>> {
        self.batches()
            .iter()
            .map(|batch| {
                batch
                    .events()
                    .iter()
                    .filter_map(|e| e.raw_search_string.clone())
                    .collect()
            })
            .collect()
    }
}

pub fn identity(collector_id: &str) -> CollectorIdentity {
    CollectorIdentity {
        index_id: "docs".to_string(),
        deployment_id: "staging".to_string(),
        collector_id: collector_id.to_string(),
        engine_version: "3.1.0".to_string(),
        api_key: "test-key".to_string(),
    }
}

pub fn collector_config(flush_size: usize, flush_interval_ms: u64, max_buffer_size: usize) -> CollectorConfig {
    CollectorConfig {
        endpoint: Url::parse("http://analytics.test/v1/search-analytics").unwrap(),
        identity: identity("engine-1"),
        flush_size,
        flush_interval: Duration::from_millis(flush_interval_ms),
        max_buffer_size,
        compression: false,
    }
}

pub fn event(term: &str) -> SearchEvent {
    SearchEvent::from_search(&json!({ "term": term }), &SearchResults::default())
}
