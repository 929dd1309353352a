//! Client configuration with precedence handling
//!
//! Precedence, lowest to highest: built-in defaults, the JSON config file,
//! environment variables, command line arguments.

use crate::errors::{Error, Result, SerializationOp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`ClientConfig::default_ttl_ms`]
pub const DEFAULT_TTL_ENV: &str = "CACHET_DEFAULT_TTL_MS";
/// Environment variable overriding [`ClientConfig::sweep_interval_ms`]
pub const SWEEP_INTERVAL_ENV: &str = "CACHET_SWEEP_INTERVAL_MS";

/// Settings shared by every cache created from a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// What an expiry of `0` means for a local store; `-1` never expires
    pub default_ttl_ms: i64,
    /// Minimum time between two expiry sweeps of a local store
    pub sweep_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: -1,
            sweep_interval_ms: 50,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_ms == 0 || self.default_ttl_ms < -1 {
            return Err(Error::configuration(format!(
                "default_ttl_ms must be -1 (never) or a positive number of milliseconds, got {}",
                self.default_ttl_ms
            )));
        }
        Ok(())
    }
}

/// A loaded configuration and where its last layer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfiguration {
    pub client: ClientConfig,
    pub source: ConfigSource,
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            source: ConfigSource::Default,
        }
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
    CommandLine,
}

/// Partial settings read from one layer
#[derive(Debug, Default)]
struct ConfigLayer {
    default_ttl_ms: Option<i64>,
    sweep_interval_ms: Option<u64>,
}

impl ConfigLayer {
    fn is_empty(&self) -> bool {
        self.default_ttl_ms.is_none() && self.sweep_interval_ms.is_none()
    }

    fn apply(self, config: &mut ClientConfiguration, source: ConfigSource) {
        if let Some(ttl) = self.default_ttl_ms {
            config.client.default_ttl_ms = ttl;
        }
        if let Some(interval) = self.sweep_interval_ms {
            config.client.sweep_interval_ms = interval;
        }
        config.source = source;
    }
}

/// Configuration loader that handles precedence
pub struct ClientConfigLoader;

impl ClientConfigLoader {
    /// Load configuration from defaults, the config file and the environment
    pub fn load() -> Result<ClientConfiguration> {
        let mut config = ClientConfiguration::default();

        let path = Self::config_file_path()?;
        if let Some(layer) = Self::load_from_file(&path)? {
            layer.apply(&mut config, ConfigSource::ConfigFile(path));
        }

        let env = Self::load_from_env();
        if !env.is_empty() {
            env.apply(
                &mut config,
                ConfigSource::EnvironmentVariable("CACHET_*".to_string()),
            );
        }

        config.client.validate()?;
        tracing::debug!(config = ?config, "loaded client configuration");
        Ok(config)
    }

    /// Apply command line arguments (highest precedence)
    pub fn apply_cli_args(
        mut config: ClientConfiguration,
        default_ttl_ms: Option<i64>,
        sweep_interval_ms: Option<u64>,
    ) -> Result<ClientConfiguration> {
        let layer = ConfigLayer {
            default_ttl_ms,
            sweep_interval_ms,
        };
        if !layer.is_empty() {
            layer.apply(&mut config, ConfigSource::CommandLine);
        }

        config.client.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/cachet/config.json`, falling back to the platform
    /// config directory
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir().ok_or_else(|| {
                Error::configuration(
                    "could not determine config directory; set XDG_CONFIG_HOME or HOME",
                )
            })?,
        };

        Ok(config_dir.join("cachet").join("config.json"))
    }

    fn load_from_file(path: &Path) -> Result<Option<ConfigLayer>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            operation: "read config file",
            source: e,
        })?;

        let file_config: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| Error::Serialization {
                key: path.display().to_string(),
                operation: SerializationOp::Deserialize,
                source: Box::new(e),
            })?;

        let mut layer = ConfigLayer::default();
        if let Some(cache) = file_config.get("cache").and_then(|v| v.as_object()) {
            layer.default_ttl_ms = cache.get("default_ttl_ms").and_then(|v| v.as_i64());
            layer.sweep_interval_ms = cache.get("sweep_interval_ms").and_then(|v| v.as_u64());
        }

        Ok(Some(layer))
    }

    fn load_from_env() -> ConfigLayer {
        ConfigLayer {
            default_ttl_ms: Self::env_value(DEFAULT_TTL_ENV),
            sweep_interval_ms: Self::env_value(SWEEP_INTERVAL_ENV),
        }
    }

    fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
        let raw = std::env::var(name).ok()?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "ignoring unparsable environment override");
                None
            }
        }
    }
}
