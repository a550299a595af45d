//! Drives the plugin hooks from newline-delimited JSON search records.

use crate::domain::{EngineInstance, SearchParams, SearchResults};
use crate::plugin::SearchPlugin;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One line of replay input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub engine: EngineInstance,
    #[serde(default)]
    pub params: SearchParams,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub results: SearchResults,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub records: u64,
    pub malformed: u64,
    pub engines: usize,
    pub interrupted: bool,
}

/// Feed every record to `plugin` until EOF or `shutdown` is cancelled.
///
/// The first record for an engine id fires `after_create`; every record
/// fires `after_search`. Lines that fail to parse are logged and skipped.
pub async fn replay<R, P>(
    reader: R,
    plugin: &P,
    shutdown: &CancellationToken,
) -> std::io::Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
    P: SearchPlugin + ?Sized,
{
    let mut lines = reader.lines();
    let mut engines = HashSet::new();
    let mut stats = ReplayStats::default();
    let mut line_number = 0u64;

    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => {
                info!("Replay interrupted after {} records", stats.records);
                stats.interrupted = true;
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break;
        };
        line_number += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: SearchRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                stats.malformed += 1;
                warn!("Skipping malformed search record on line {}: {}", line_number, e);
                continue;
            }
        };

        if engines.insert(record.engine.id.clone()) {
            debug!("New engine instance {}", record.engine.id);
            plugin.after_create(&record.engine);
        }

        plugin.after_search(
            &record.engine,
            &record.params,
            record.language.as_deref(),
            &record.results,
        );
        stats.records += 1;
    }

    stats.engines = engines.len();
    Ok(stats)
}
