use crate::domain::SearchEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What caused a batch to be formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchType {
    SizeBased,
    TimeBased,
    Shutdown,
}

impl BatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchType::SizeBased => "size",
            BatchType::TimeBased => "time",
            BatchType::Shutdown => "shutdown",
        }
    }
}

/// Fields attached to every batch a collector sends.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorIdentity {
    pub index_id: String,
    pub deployment_id: String,
    pub collector_id: String,
    pub engine_version: String,
    pub api_key: String,
}

impl std::fmt::Debug for CollectorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorIdentity")
            .field("index_id", &self.index_id)
            .field("deployment_id", &self.deployment_id)
            .field("collector_id", &self.collector_id)
            .field("engine_version", &self.engine_version)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Snapshot of the buffer at flush time, the unit of delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    batch_id: Uuid,
    #[serde(flatten)]
    identity: CollectorIdentity,
    trigger: BatchType,
    sent_at: DateTime<Utc>,
    events: Vec<SearchEvent>,
}

impl Batch {
    pub fn new(identity: CollectorIdentity, events: Vec<SearchEvent>, batch_type: BatchType) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            identity,
            trigger: batch_type,
            sent_at: Utc::now(),
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.batch_id
    }

    pub fn identity(&self) -> &CollectorIdentity {
        &self.identity
    }

    pub fn batch_type(&self) -> BatchType {
        self.trigger
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[SearchEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SearchEvent> {
        self.events
    }
}
