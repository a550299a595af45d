use crate::domain::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ANALYTICS_ENDPOINT: &str = "http://rask-log-aggregator:9600/v1/search-analytics";
pub const DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_ANALYTICS_FLUSH_SIZE: usize = 25;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10_000;
pub const DEFAULT_DEPLOYMENT_ID: &str = "unknown";
pub const DEFAULT_ENGINE_VERSION: &str = "unknown";

/// Host-facing plugin options. Unset or zero values take the defaults above.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginParams {
    pub api_key: String,
    pub index_id: String,
    pub enabled: Option<bool>,
    pub deployment_id: Option<String>,
    pub endpoint: Option<String>,
    /// Milliseconds.
    pub flush_interval: Option<u64>,
    pub flush_size: Option<usize>,
    pub max_buffer_size: Option<usize>,
    pub compression: bool,
}

impl std::fmt::Debug for PluginParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginParams")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("index_id", &self.index_id)
            .field("enabled", &self.enabled)
            .field("deployment_id", &self.deployment_id)
            .field("endpoint", &self.endpoint)
            .field("flush_interval", &self.flush_interval)
            .field("flush_size", &self.flush_size)
            .field("max_buffer_size", &self.max_buffer_size)
            .field("compression", &self.compression)
            .finish()
    }
}

impl PluginParams {
    pub fn new(api_key: impl Into<String>, index_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            index_id: index_id.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// Apply defaults and check required fields.
    pub fn resolve(&self) -> Result<PluginSettings, ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingField("apiKey"));
        }
        if self.index_id.is_empty() {
            return Err(ConfigError::MissingField("indexId"));
        }

        let endpoint_str = non_empty(self.endpoint.as_deref()).unwrap_or(DEFAULT_ANALYTICS_ENDPOINT);
        let endpoint = Url::parse(endpoint_str).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint_str.to_string(),
            reason: e.to_string(),
        })?;

        let flush_size = non_zero(self.flush_size).unwrap_or(DEFAULT_ANALYTICS_FLUSH_SIZE);
        let max_buffer_size = non_zero(self.max_buffer_size).unwrap_or(DEFAULT_MAX_BUFFER_SIZE);
        if max_buffer_size < flush_size {
            return Err(ConfigError::Invalid(format!(
                "Max buffer size ({max_buffer_size}) must be at least as large as flush size ({flush_size})"
            )));
        }

        Ok(PluginSettings {
            api_key: self.api_key.clone(),
            index_id: self.index_id.clone(),
            deployment_id: non_empty(self.deployment_id.as_deref())
                .unwrap_or(DEFAULT_DEPLOYMENT_ID)
                .to_string(),
            endpoint,
            flush_interval: Duration::from_millis(
                non_zero(self.flush_interval).unwrap_or(DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS),
            ),
            flush_size,
            max_buffer_size,
            compression: self.compression,
        })
    }
}

/// Plugin options after defaults have been applied.
#[derive(Clone)]
pub struct PluginSettings {
    pub api_key: String,
    pub index_id: String,
    pub deployment_id: String,
    pub endpoint: Url,
    pub flush_interval: Duration,
    pub flush_size: usize,
    pub max_buffer_size: usize,
    pub compression: bool,
}

impl std::fmt::Debug for PluginSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSettings")
            .field("index_id", &self.index_id)
            .field("deployment_id", &self.deployment_id)
            .field("endpoint", &self.endpoint.as_str())
            .field("flush_interval", &self.flush_interval)
            .field("flush_size", &self.flush_size)
            .field("max_buffer_size", &self.max_buffer_size)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn non_zero<T: Default + PartialEq>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let settings = PluginParams::new("key", "docs").resolve().unwrap();

        assert_eq!(settings.endpoint.as_str(), DEFAULT_ANALYTICS_ENDPOINT);
        assert_eq!(settings.deployment_id, DEFAULT_DEPLOYMENT_ID);
        assert_eq!(
            settings.flush_interval,
            Duration::from_millis(DEFAULT_ANALYTICS_FLUSH_INTERVAL_MS)
        );
        assert_eq!(settings.flush_size, DEFAULT_ANALYTICS_FLUSH_SIZE);
        assert_eq!(settings.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE);
        assert!(!settings.compression);
    }

    #[test]
    fn test_zero_and_empty_values_fall_back_to_defaults() {
        let params = PluginParams {
            flush_interval: Some(0),
            flush_size: Some(0),
            deployment_id: Some(String::new()),
            endpoint: Some(String::new()),
            ..PluginParams::new("key", "docs")
        };
        let settings = params.resolve().unwrap();

        assert_eq!(settings.flush_size, DEFAULT_ANALYTICS_FLUSH_SIZE);
        assert_eq!(settings.deployment_id, DEFAULT_DEPLOYMENT_ID);
        assert_eq!(settings.endpoint.as_str(), DEFAULT_ANALYTICS_ENDPOINT);
    }

    #[test]
    fn test_missing_required_fields() {
        assert_eq!(
            PluginParams::new("", "docs").resolve().unwrap_err(),
            ConfigError::MissingField("apiKey")
        );
        assert_eq!(
            PluginParams::new("key", "").resolve().unwrap_err(),
            ConfigError::MissingField("indexId")
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let params = PluginParams {
            endpoint: Some("not a url".to_string()),
            ..PluginParams::new("key", "docs")
        };
        assert!(matches!(
            params.resolve(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        assert!(PluginParams::default().is_enabled());
        let disabled = PluginParams {
            enabled: Some(false),
            ..PluginParams::default()
        };
        assert!(!disabled.is_enabled());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", PluginParams::new("super-secret", "docs"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_deserializes_camel_case() {
        let params: PluginParams = serde_json::from_str(
            r#"{"apiKey":"k","indexId":"docs","flushInterval":1000,"flushSize":3,"enabled":true}"#,
        )
        .unwrap();
        let settings = params.resolve().unwrap();
        assert_eq!(settings.flush_interval, Duration::from_millis(1000));
        assert_eq!(settings.flush_size, 3);
    }
}
