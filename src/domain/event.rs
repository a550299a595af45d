use super::engine::{SearchParams, SearchResults};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Identity and score of one ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRef {
    pub id: String,
    pub score: f64,
}

/// One observed search operation.
///
/// Built once on the search path and never touched again: the buffer, the
/// batch and the serializer only ever read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEvent {
    pub query: Value,
    pub results_count: u64,
    /// Milliseconds.
    pub round_trip_time: u64,
    pub searched_at: DateTime<Utc>,
    /// Reserved for a future cache layer; always false.
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_search_string: Option<String>,
    #[serde(default)]
    pub results: Vec<HitRef>,
}

impl SearchEvent {
    /// Build an event from the engine's post-search artifacts, stamped now.
    pub fn from_search(params: &SearchParams, results: &SearchResults) -> Self {
        Self::captured_at(params, results, Utc::now())
    }

    pub fn captured_at(
        params: &SearchParams,
        results: &SearchResults,
        searched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query: params.clone(),
            results_count: results.count,
            round_trip_time: nanos_to_millis(results.elapsed.raw),
            searched_at,
            cached: false,
            raw_search_string: raw_term(params),
            results: results
                .hits
                .iter()
                .map(|hit| HitRef {
                    id: hit.id.clone(),
                    score: hit.score,
                })
                .collect(),
        }
    }
}

/// Nanoseconds to milliseconds, rounding half up.
pub fn nanos_to_millis(nanos: u64) -> u64 {
    nanos.saturating_add(NANOS_PER_MILLI / 2) / NANOS_PER_MILLI
}

fn raw_term(params: &SearchParams) -> Option<String> {
    match params.get("term")? {
        Value::Null => None,
        Value::String(term) => Some(term.clone()),
        other => Some(other.to_string()),
    }
}
