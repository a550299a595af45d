use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rask_search_analytics::buffer::{Batch, BatchType, CollectorIdentity, EventQueue};
use rask_search_analytics::collector::{Collector, CollectorConfig};
use rask_search_analytics::domain::{ElapsedTime, SearchEvent, SearchHit, SearchResults};
use rask_search_analytics::sender::{BatchSerializer, NullTransport};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn create_test_event(id: usize) -> SearchEvent {
    let results = SearchResults {
        count: 3,
        elapsed: ElapsedTime {
            raw: 1_250_000 + id as u64,
            formatted: "1ms".to_string(),
        },
        hits: (0..3)
            .map(|rank| SearchHit {
                id: format!("doc-{id}-{rank}"),
                score: 1.0 / (rank as f64 + 1.0),
                document: serde_json::Value::Null,
            })
            .collect(),
    };
    SearchEvent::captured_at(
        &json!({ "term": format!("query {id}"), "limit": 10 }),
        &results,
        Utc::now(),
    )
}

fn identity() -> CollectorIdentity {
    CollectorIdentity {
        index_id: "bench".to_string(),
        deployment_id: "bench".to_string(),
        collector_id: "engine-bench".to_string(),
        engine_version: "unknown".to_string(),
        api_key: "bench-key".to_string(),
    }
}

fn bench_enqueue_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_drain");

    for &size in &[100, 1_000, 10_000] {
        let events: Vec<SearchEvent> = (0..size).map(create_test_event).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &events, |b, events| {
            b.iter(|| {
                let queue = EventQueue::new(size).expect("Failed to create queue for benchmark");
                for event in events {
                    queue.enqueue(event.clone());
                }
                black_box(queue.drain().len())
            });
        });
    }

    group.finish();
}

fn bench_overflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_overflow");
    let events: Vec<SearchEvent> = (0..10_000).map(create_test_event).collect();

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("capacity_1000", |b| {
        b.iter(|| {
            let queue = EventQueue::new(1_000).expect("Failed to create queue for benchmark");
            for event in &events {
                black_box(queue.enqueue(event.clone()).dropped);
            }
        });
    });

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_batch");

    for compression in [false, true] {
        let serializer = BatchSerializer::new(compression);
        let batch = Batch::new(
            identity(),
            (0..25).map(create_test_event).collect(),
            BatchType::SizeBased,
        );

        group.bench_with_input(
            BenchmarkId::new("flush_size_25", if compression { "gzip" } else { "plain" }),
            &batch,
            |b, batch| {
                b.iter(|| {
                    black_box(
                        serializer
                            .serialize(batch)
                            .expect("Failed to serialize batch for benchmark"),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_collector_add(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime for benchmark");
    let _guard = rt.enter();

    let collector = Collector::create(
        CollectorConfig {
            endpoint: Url::parse("http://localhost:9600/v1/search-analytics")
                .expect("Failed to parse benchmark endpoint"),
            identity: identity(),
            flush_size: 25,
            flush_interval: Duration::from_secs(60),
            max_buffer_size: 10_000,
            compression: false,
        },
        Arc::new(NullTransport),
    )
    .expect("Failed to create collector for benchmark");

    let events: Vec<SearchEvent> = (0..1_000).map(create_test_event).collect();

    let mut group = c.benchmark_group("collector_add");
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("flush_size_25", |b| {
        b.iter(|| {
            for event in &events {
                collector.add(event.clone());
            }
        });
    });
    group.finish();

    collector.close();
}

criterion_group!(
    benches,
    bench_enqueue_drain,
    bench_overflow,
    bench_serialize,
    bench_collector_add
);
criterion_main!(benches);
