//! Configuration management for Ratewarden.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::error::{RateWardenError, Result};

/// Prefix for environment variable overrides, e.g.
/// `RATEWARDEN__RATE_LIMITING__MAX_REQUESTS=20`.
pub const ENV_PREFIX: &str = "RATEWARDEN";

/// Main configuration for the Ratewarden service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateWardenConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Length of the sliding window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum admitted requests per key within one window
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// How often idle keys are evicted, in seconds (0 disables the sweeper)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_window_secs() -> u64 {
    10
}

fn default_max_requests() -> usize {
    5
}

fn default_sweep_interval() -> u64 {
    60
}

/// Values supplied on the command line. Each one that is set replaces the
/// file and environment value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_addr: Option<SocketAddr>,
    pub window_secs: Option<u64>,
    pub max_requests: Option<usize>,
    pub sweep_interval_secs: Option<u64>,
}

impl RateWardenConfig {
    /// Load configuration with precedence file < environment < `overrides`.
    ///
    /// The file format is inferred from its extension (YAML, TOML or JSON).
    /// Validation runs after all layers are applied.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let mut config: RateWardenConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Replace every field that has an override.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(listen_addr) = overrides.listen_addr {
            self.server.listen_addr = listen_addr;
        }
        if let Some(window_secs) = overrides.window_secs {
            self.rate_limiting.window_secs = window_secs;
        }
        if let Some(max_requests) = overrides.max_requests {
            self.rate_limiting.max_requests = max_requests;
        }
        if let Some(sweep_interval_secs) = overrides.sweep_interval_secs {
            self.rate_limiting.sweep_interval_secs = sweep_interval_secs;
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RateWardenConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RateWardenError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the rate limiting parameters are usable.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.window_secs == 0 {
            return Err(RateWardenError::Config(
                "rate_limiting.window_secs must be positive".to_string(),
            ));
        }
        if self.rate_limiting.max_requests == 0 {
            return Err(RateWardenError::Config(
                "rate_limiting.max_requests must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateWardenConfig::default();
        assert_eq!(config.rate_limiting.window_secs, 10);
        assert_eq!(config.rate_limiting.max_requests, 5);
        assert_eq!(config.rate_limiting.sweep_interval_secs, 60);
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
rate_limiting:
  max_requests: 20
"#;
        let config = RateWardenConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.rate_limiting.max_requests, 20);
        assert_eq!(config.rate_limiting.window_secs, 10);
        assert_eq!(config.server.listen_addr, default_listen_addr());
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
server:
  listen_addr: "0.0.0.0:9000"
rate_limiting:
  window_secs: 30
  max_requests: 100
  sweep_interval_secs: 0
"#;
        let config = RateWardenConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.rate_limiting.window_secs, 30);
        assert_eq!(config.rate_limiting.max_requests, 100);
        assert_eq!(config.rate_limiting.sweep_interval_secs, 0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let yaml = r#"
rate_limiting:
  window_secs: 0
"#;
        let err = RateWardenConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, RateWardenError::Config(_)));
    }

    #[test]
    fn test_zero_max_requests_rejected() {
        let mut config = RateWardenConfig::default();
        config.rate_limiting.max_requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = RateWardenConfig::from_yaml("rate_limiting: [1, 2").unwrap_err();
        assert!(matches!(err, RateWardenError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "ratewarden-config-test-{}.yaml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "rate_limiting:\n  window_secs: 2\n  max_requests: 3\n",
        )
        .unwrap();

        let config = RateWardenConfig::load(Some(&path), &ConfigOverrides::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.rate_limiting.window_secs, 2);
        assert_eq!(config.rate_limiting.max_requests, 3);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = Path::new("/nonexistent/ratewarden.yaml");
        let err = RateWardenConfig::load(Some(path), &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, RateWardenError::ConfigSource(_)));
    }

    fn temp_config_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "ratewarden-{}-{}.yaml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_cli_override_fixes_invalid_file_value() {
        let path = temp_config_file("invalid-window", "rate_limiting:\n  window_secs: 0\n");

        let without = RateWardenConfig::load(Some(&path), &ConfigOverrides::default());
        let with = RateWardenConfig::load(
            Some(&path),
            &ConfigOverrides {
                window_secs: Some(5),
                ..Default::default()
            },
        );
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(without, Err(RateWardenError::Config(_))));
        assert_eq!(with.unwrap().rate_limiting.window_secs, 5);
    }

    #[test]
    fn test_apply_overrides_replaces_only_set_fields() {
        let mut config = RateWardenConfig::default();
        config.apply_overrides(&ConfigOverrides {
            listen_addr: Some("0.0.0.0:9999".parse().unwrap()),
            max_requests: Some(50),
            ..Default::default()
        });

        assert_eq!(config.server.listen_addr.port(), 9999);
        assert_eq!(config.rate_limiting.max_requests, 50);
        assert_eq!(config.rate_limiting.window_secs, 10);
        assert_eq!(config.rate_limiting.sweep_interval_secs, 60);
    }

    // Only this test sets environment variables, and only for the sweep
    // interval, which no other loading test asserts on.
    #[test]
    fn test_layer_precedence_file_env_cli() {
        const VAR: &str = "RATEWARDEN__RATE_LIMITING__SWEEP_INTERVAL_SECS";
        let path = temp_config_file("precedence", "rate_limiting:\n  sweep_interval_secs: 5\n");
        std::env::set_var(VAR, "30");

        let env_only = RateWardenConfig::load(None, &ConfigOverrides::default());
        let env_over_file = RateWardenConfig::load(Some(&path), &ConfigOverrides::default());
        let cli_over_env = RateWardenConfig::load(
            Some(&path),
            &ConfigOverrides {
                sweep_interval_secs: Some(90),
                ..Default::default()
            },
        );

        std::env::remove_var(VAR);
        let file_only = RateWardenConfig::load(Some(&path), &ConfigOverrides::default());
        std::fs::remove_file(&path).unwrap();

        assert_eq!(env_only.unwrap().rate_limiting.sweep_interval_secs, 30);
        assert_eq!(env_over_file.unwrap().rate_limiting.sweep_interval_secs, 30);
        assert_eq!(cli_over_env.unwrap().rate_limiting.sweep_interval_secs, 90);
        assert_eq!(file_only.unwrap().rate_limiting.sweep_interval_secs, 5);
    }
}
