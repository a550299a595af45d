//! Search engine plugin adapter.
//!
//! The engine calls [`SearchPlugin::after_create`] once per instance and
//! [`SearchPlugin::after_search`] after every query. [`AnalyticsPlugin`]
//! keeps one [`Collector`] per engine instance and feeds it events.

pub mod params;

pub use params::{PluginParams, PluginSettings};

use crate::buffer::CollectorIdentity;
use crate::collector::{Collector, CollectorConfig};
use crate::domain::{ConfigError, EngineInstance, SearchEvent, SearchParams, SearchResults};
use crate::metrics::CollectorMetricsSnapshot;
use crate::sender::Transport;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const PLUGIN_NAME: &str = "plugin-analytics";

/// Engine lifecycle hooks. Hooks have no error channel: whatever goes wrong
/// inside a plugin stays inside it.
pub trait SearchPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn after_create(&self, _engine: &EngineInstance) {}

    fn after_search(
        &self,
        _engine: &EngineInstance,
        _params: &SearchParams,
        _language: Option<&str>,
        _results: &SearchResults,
    ) {
    }
}

pub struct AnalyticsPlugin {
    state: PluginState,
}

enum PluginState {
    Disabled,
    Enabled {
        settings: PluginSettings,
        transport: Arc<dyn Transport>,
        collectors: RwLock<HashMap<String, Collector>>,
    },
}

impl AnalyticsPlugin {
    /// Build the plugin. With `enabled: false` every hook is a no-op and the
    /// remaining params are not checked; otherwise missing `apiKey` /
    /// `indexId` fail here, before any hook can run.
    pub fn new(params: PluginParams, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        if !params.is_enabled() {
            info!("Search analytics plugin disabled");
            return Ok(Self {
                state: PluginState::Disabled,
            });
        }

        let settings = params.resolve()?;
        debug!("Search analytics plugin configured: {:?}", settings);

        Ok(Self {
            state: PluginState::Enabled {
                settings,
                transport,
                collectors: RwLock::new(HashMap::new()),
            },
        })
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, PluginState::Enabled { .. })
    }

    pub fn settings(&self) -> Option<&PluginSettings> {
        match &self.state {
            PluginState::Enabled { settings, .. } => Some(settings),
            PluginState::Disabled => None,
        }
    }

    pub fn collector_count(&self) -> usize {
        match &self.state {
            PluginState::Enabled { collectors, .. } => collectors.read().len(),
            PluginState::Disabled => 0,
        }
    }

    pub fn has_collector(&self, engine_id: &str) -> bool {
        self.with_collector(engine_id, |_| ()).is_some()
    }

    pub fn with_collector<R>(&self, engine_id: &str, f: impl FnOnce(&Collector) -> R) -> Option<R> {
        match &self.state {
            PluginState::Enabled { collectors, .. } => collectors.read().get(engine_id).map(f),
            PluginState::Disabled => None,
        }
    }

    /// Per-engine counters, sorted by engine id.
    pub fn metrics(&self) -> Vec<(String, CollectorMetricsSnapshot)> {
        let PluginState::Enabled { collectors, .. } = &self.state else {
            return Vec::new();
        };

        let mut all: Vec<_> = collectors
            .read()
            .iter()
            .map(|(id, collector)| (id.clone(), collector.metrics()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Final flush for every collector, then forget them.
    pub fn close_all(&self) {
        let PluginState::Enabled { collectors, .. } = &self.state else {
            return;
        };

        let drained: Vec<Collector> = collectors.write().drain().map(|(_, c)| c).collect();
        for collector in &drained {
            collector.close();
        }

        if !drained.is_empty() {
            info!("Closed {} search analytics collectors", drained.len());
        }
    }

    fn collector_config(settings: &PluginSettings, engine: &EngineInstance) -> CollectorConfig {
        CollectorConfig {
            endpoint: settings.endpoint.clone(),
            identity: CollectorIdentity {
                index_id: settings.index_id.clone(),
                deployment_id: settings.deployment_id.clone(),
                collector_id: engine.id.clone(),
                engine_version: engine
                    .version
                    .clone()
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| params::DEFAULT_ENGINE_VERSION.to_string()),
                api_key: settings.api_key.clone(),
            },
            flush_size: settings.flush_size,
            flush_interval: settings.flush_interval,
            max_buffer_size: settings.max_buffer_size,
            compression: settings.compression,
        }
    }
}

impl SearchPlugin for AnalyticsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn after_create(&self, engine: &EngineInstance) {
        let PluginState::Enabled {
            settings,
            transport,
            collectors,
        } = &self.state
        else {
            return;
        };

        let config = Self::collector_config(settings, engine);
        let collector = match Collector::create(config, transport.clone()) {
            Ok(collector) => collector,
            Err(e) => {
                error!(
                    "Failed to create analytics collector for engine {}: {}",
                    engine.id, e
                );
                return;
            }
        };

        // Replacing closes the previous collector through its Drop
        let previous = collectors.write().insert(engine.id.clone(), collector);
        if previous.is_some() {
            info!("Replaced analytics collector for engine {}", engine.id);
        }
    }

    fn after_search(
        &self,
        engine: &EngineInstance,
        params: &SearchParams,
        _language: Option<&str>,
        results: &SearchResults,
    ) {
        let PluginState::Enabled { collectors, .. } = &self.state else {
            return;
        };

        match collectors.read().get(&engine.id) {
            Some(collector) => collector.add(SearchEvent::from_search(params, results)),
            None => debug!("No analytics collector for engine {}, ignoring search", engine.id),
        }
    }
}

impl Drop for AnalyticsPlugin {
    fn drop(&mut self) {
        self.close_all();
    }
}

impl std::fmt::Debug for AnalyticsPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsPlugin")
            .field("enabled", &self.is_enabled())
            .field("settings", &self.settings())
            .field("collectors", &self.collector_count())
            .finish()
    }
}
