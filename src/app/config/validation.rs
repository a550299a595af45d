use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| crate::domain::ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        // Required fields only matter when the plugin will actually run
        if self.enabled {
            self.plugin_params().resolve()?;
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.enable_metrics && self.metrics_port == 0 {
            return Err(ConfigError::InvalidConfig(
                "Metrics port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
