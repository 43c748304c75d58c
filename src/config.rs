use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::store::ReadVisibility;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_BACKWARD_SCAN_DEPTH: u64 = 10_000;

pub const ENV_BACKWARD_SCAN_ENABLED: &str = "BACKWARD_SCAN_ENABLED";
pub const ENV_BACKWARD_SCAN_DEPTH: &str = "BACKWARD_SCAN_DEPTH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub rpc: RpcConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcConfig {
    pub url: String,
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Block scanner settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Forward poll interval; zero falls back to the default
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_backward_scan_enabled")]
    pub backward_scan_enabled: bool,
    /// Signed on purpose: non-positive values are coerced to the default
    #[serde(default = "default_backward_scan_depth")]
    pub backward_scan_depth: i64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_backward_scan_enabled() -> bool {
    true
}

fn default_backward_scan_depth() -> i64 {
    DEFAULT_BACKWARD_SCAN_DEPTH as i64
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backward_scan_enabled: true,
            backward_scan_depth: DEFAULT_BACKWARD_SCAN_DEPTH as i64,
        }
    }
}

impl ScannerConfig {
    pub fn new(poll_interval: Duration, backward_scan_enabled: bool, backward_scan_depth: i64) -> Self {
        Self {
            poll_interval_ms: poll_interval.as_millis() as u64,
            backward_scan_enabled,
            backward_scan_depth,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        if self.poll_interval_ms == 0 {
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        } else {
            Duration::from_millis(self.poll_interval_ms)
        }
    }

    /// Effective backward scan depth (always positive)
    pub fn backward_scan_depth(&self) -> u64 {
        if self.backward_scan_depth <= 0 {
            DEFAULT_BACKWARD_SCAN_DEPTH
        } else {
            self.backward_scan_depth as u64
        }
    }

    /// Apply `BACKWARD_SCAN_ENABLED` / `BACKWARD_SCAN_DEPTH` overrides.
    ///
    /// Unparsable values and non-positive depths are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = lookup(ENV_BACKWARD_SCAN_ENABLED).and_then(|v| parse_bool(&v)) {
            self.backward_scan_enabled = enabled;
        }
        if let Some(depth) = lookup(ENV_BACKWARD_SCAN_DEPTH)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|d| *d > 0)
        {
            self.backward_scan_depth = depth;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub read_visibility: ReadVisibility,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        Self::from_file(&format!("config/{}.yaml", env))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Apply process environment overrides on top of the file values
    pub fn with_env_overrides(mut self) -> Self {
        self.scanner.apply_overrides(|key| std::env::var(key).ok());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DEV_YAML: &str = r#"
log_level: "info"
log_dir: "./logs"
log_file: "tx_indexer.log"
use_json: false
rotation: "daily"
rpc:
  url: "http://127.0.0.1:8545"
scanner:
  poll_interval_ms: 2000
  backward_scan_enabled: false
  backward_scan_depth: 500
store:
  read_visibility: all
gateway:
  host: "0.0.0.0"
  port: 8080
"#;

    #[test]
    fn test_app_config_deserialize() {
        let config: AppConfig = serde_yaml::from_str(DEV_YAML).unwrap();

        assert_eq!(config.rpc.url, "http://127.0.0.1:8545");
        assert_eq!(config.rpc.timeout(), Duration::from_secs(30));
        assert_eq!(config.scanner.poll_interval(), Duration::from_millis(2000));
        assert!(!config.scanner.backward_scan_enabled);
        assert_eq!(config.scanner.backward_scan_depth(), 500);
        assert_eq!(config.store.read_visibility, ReadVisibility::All);
        assert_eq!(config.gateway.port, 8080);
    }

    #[test]
    fn test_scanner_section_defaults() {
        let yaml = r#"
log_level: "debug"
log_dir: "./logs"
log_file: "x.log"
use_json: true
rotation: "never"
rpc:
  url: "http://node"
  timeout_secs: 5
gateway:
  host: "127.0.0.1"
  port: 9000
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.scanner, ScannerConfig::default());
        assert!(config.scanner.backward_scan_enabled);
        assert_eq!(config.scanner.backward_scan_depth(), 10_000);
        assert_eq!(config.store.read_visibility, ReadVisibility::SubscribedOnly);
        assert_eq!(config.rpc.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_non_positive_depth_is_coerced() {
        let zero = ScannerConfig::new(Duration::from_secs(1), true, 0);
        assert_eq!(zero.backward_scan_depth(), DEFAULT_BACKWARD_SCAN_DEPTH);

        let negative = ScannerConfig::new(Duration::from_secs(1), true, -5);
        assert_eq!(negative.backward_scan_depth(), DEFAULT_BACKWARD_SCAN_DEPTH);

        let positive = ScannerConfig::new(Duration::from_secs(1), true, 42);
        assert_eq!(positive.backward_scan_depth(), 42);
    }

    #[test]
    fn test_zero_poll_interval_falls_back() {
        let config = ScannerConfig::new(Duration::ZERO, true, 1);
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKWARD_SCAN_ENABLED, "false"),
            (ENV_BACKWARD_SCAN_DEPTH, "250"),
        ]
        .into_iter()
        .collect();

        let mut config = ScannerConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert!(!config.backward_scan_enabled);
        assert_eq!(config.backward_scan_depth(), 250);
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKWARD_SCAN_ENABLED, "maybe"),
            (ENV_BACKWARD_SCAN_DEPTH, "-3"),
        ]
        .into_iter()
        .collect();

        let mut config = ScannerConfig::new(Duration::from_secs(1), true, 77);
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert!(config.backward_scan_enabled);
        assert_eq!(config.backward_scan_depth(), 77);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("F"), Some(false));
        assert_eq!(parse_bool("no"), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::from_file("config/does-not-exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_shipped_dev_config_parses() {
        let config = AppConfig::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.yaml"))
            .unwrap();
        assert!(config.scanner.backward_scan_enabled);
    }
}
