use rask_search_analytics::app::{App, Config};
use rask_search_analytics::sender::BatchSerializer;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

fn write_records(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

fn config(server: &MockServer, input: &NamedTempFile) -> Config {
    let mut config = Config {
        api_key: "replay-key".to_string(),
        index_id: "docs".to_string(),
        endpoint: format!("{}/v1/search-analytics", server.uri()),
        flush_size: 2,
        flush_interval_ms: 60_000,
        input: Some(input.path().to_path_buf()),
        ..Config::default()
    };
    config.post_process().unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_replay_delivers_all_batches_before_exit() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let input = write_records(&[
        r#"{"engine":{"id":"a","version":"1.0.0"},"params":{"term":"one"},"results":{"count":1,"elapsed":{"raw":2000000},"hits":[{"id":"d1","score":1.5}]}}"#,
        r#"{"engine":{"id":"b"},"params":{"term":"two"},"results":{"count":0}}"#,
        "this line is not json",
        r#"{"engine":{"id":"a"},"params":{"term":"three"},"results":{"count":4}}"#,
    ]);

    let app = App::from_config(config(&server, &input)).await?;
    let stats = app.run().await?;

    assert_eq!(stats.records, 3);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.engines, 2);
    assert!(!stats.interrupted);

    // Engine a flushed on size, engine b on shutdown
    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 2);

    let mut batches: Vec<_> = received
        .iter()
        .map(|r| BatchSerializer::decode(&r.body, false))
        .collect::<Result<_, _>>()?;
    batches.sort_by(|x, y| x.identity().collector_id.cmp(&y.identity().collector_id));

    assert_eq!(batches[0].identity().collector_id, "a");
    assert_eq!(batches[0].identity().engine_version, "1.0.0");
    assert_eq!(batches[0].size(), 2);
    assert_eq!(batches[0].events()[0].round_trip_time, 2);
    assert_eq!(batches[1].identity().collector_id, "b");
    assert_eq!(batches[1].size(), 1);
    Ok(())
}

#[tokio::test]
async fn test_disabled_app_sends_nothing() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let input = write_records(&[r#"{"engine":{"id":"a"},"params":{"term":"one"}}"#]);
    let config = Config {
        enabled: false,
        ..config(&server, &input)
    };

    let app = App::from_config(config).await?;
    assert!(!app.plugin().is_enabled());

    let stats = app.run().await?;
    assert_eq!(stats.records, 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_input_file_is_an_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let input = write_records(&[]);
    let mut config = config(&server, &input);
    config.input = Some("/nonexistent/searches.ndjson".into());

    let app = App::from_config(config).await?;
    assert!(app.run().await.is_err());
    Ok(())
}
