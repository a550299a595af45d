use crate::buffer::CollectorIdentity;
use crate::domain::ConfigError;
use std::time::Duration;
use url::Url;

/// Everything one collector needs. Fixed for the collector's lifetime.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub endpoint: Url,
    pub identity: CollectorIdentity,
    /// Flush as soon as this many events are queued.
    pub flush_size: usize,
    /// Flush whatever is queued this long after the previous flush.
    pub flush_interval: Duration,
    /// Ring-buffer cap; the oldest events are dropped beyond it.
    pub max_buffer_size: usize,
    pub compression: bool,
}

impl CollectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.api_key.is_empty() {
            return Err(ConfigError::MissingField("apiKey"));
        }
        if self.identity.index_id.is_empty() {
            return Err(ConfigError::MissingField("indexId"));
        }

        if self.flush_size == 0 {
            return Err(ConfigError::Invalid(
                "Flush size must be greater than 0".to_string(),
            ));
        }

        if self.flush_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "Flush interval must be greater than 0".to_string(),
            ));
        }

        if self.max_buffer_size < self.flush_size {
            return Err(ConfigError::Invalid(format!(
                "Max buffer size ({}) must be at least as large as flush size ({})",
                self.max_buffer_size, self.flush_size
            )));
        }

        Ok(())
    }
}
