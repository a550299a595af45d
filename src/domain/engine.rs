use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request parameters exactly as submitted to the engine. Opaque to the collector.
pub type SearchParams = Value;

/// Identity of one search engine instance, as seen by `after_create`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineInstance {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl EngineInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Engine-reported search latency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElapsedTime {
    /// Nanoseconds.
    pub raw: u64,
    #[serde(default)]
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub document: Value,
}

/// Raw post-search artifacts handed to `after_search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: u64,
    #[serde(default)]
    pub elapsed: ElapsedTime,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}
