//! Domain layer for rask-search-analytics.
//!
//! Contains the canonical types shared across all modules:
//! - `SearchEvent`: one observed search, the pipeline's core data type
//! - `EngineInstance` / `SearchResults`: what the search engine hands to the plugin hooks
//! - `AnalyticsError` / `ConfigError`: error types

pub mod engine;
pub mod error;
pub mod event;

pub use engine::{ElapsedTime, EngineInstance, SearchHit, SearchParams, SearchResults};
pub use error::{AnalyticsError, ConfigError};
pub use event::{HitRef, SearchEvent, nanos_to_millis};
