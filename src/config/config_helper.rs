//! Configuration helper for interpreting config values.
//!
//! The `ConfigHelper` wraps a `Config` and converts its sections into the
//! settings types the components take.

use crate::repository::RetryPolicy;
use crate::store::Timeouts;

use super::Config;

/// Helper for interpreting configuration values.
#[derive(Debug, Clone)]
pub struct ConfigHelper {
    config: Config,
}

impl ConfigHelper {
    /// Create a new ConfigHelper wrapping the given config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the underlying config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            read: self.config.remote.read_timeout.0,
            write: self.config.remote.write_timeout.0,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.retry.max_attempts.max(1),
            base_delay: self.config.retry.base_delay.0,
        }
    }

    /// LMDB map size, clamped to what the platform can address.
    pub fn mirror_map_size(&self) -> usize {
        usize::try_from(self.config.mirror.map_size.0).unwrap_or(usize::MAX)
    }

    /// User-Agent sent with every remote request.
    pub fn user_agent(&self) -> String {
        let agent = self.config.remote.user_agent.trim();
        if agent.contains('/') {
            agent.to_string()
        } else {
            format!("{}/{}", agent, env!("CARGO_PKG_VERSION"))
        }
    }
}

impl From<Config> for ConfigHelper {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{read_config, ConfigSource};
    use std::time::Duration;

    fn helper(overrides: &[(&str, &str)]) -> ConfigHelper {
        let source = ConfigSource {
            config_file: None,
            override_file: None,
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        ConfigHelper::new(read_config(&source).unwrap().config)
    }

    #[test]
    fn test_defaults_match_component_defaults() {
        let helper = helper(&[]);
        assert_eq!(helper.timeouts(), Timeouts::default());
        assert_eq!(helper.retry_policy(), RetryPolicy::default());
        assert!(helper.user_agent().starts_with("folio-sync/"));
    }

    #[test]
    fn test_overrides_flow_into_settings() {
        let helper = helper(&[
            ("remote.read_timeout", "5s"),
            ("retry.max_attempts", "0"),
            ("retry.base_delay", "250ms"),
            ("remote.user_agent", "my-site/2.0"),
        ]);
        assert_eq!(helper.timeouts().read, Duration::from_secs(5));
        assert_eq!(helper.retry_policy().max_attempts, 1);
        assert_eq!(helper.retry_policy().base_delay, Duration::from_millis(250));
        assert_eq!(helper.user_agent(), "my-site/2.0");
    }
}
