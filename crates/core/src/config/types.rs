use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::batch::BatchConfig;
use crate::converter::ConverterConfig;
use crate::store::StoreConfig;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
max_upload_bytes = 1024

[converter]
timeout_secs = 30

[batch]
max_parallel_jobs = 2
max_files_per_batch = 10
event_buffer = 8

[store]
retention_secs = 60
sweep_interval_secs = 5
max_total_bytes = 4096
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.max_upload_bytes, 1024);
        assert_eq!(config.converter.timeout_secs, 30);
        assert_eq!(config.batch.max_parallel_jobs, 2);
        assert_eq!(config.batch.event_buffer, 8);
        assert_eq!(config.store.retention_secs, 60);
        assert_eq!(config.store.max_total_bytes, Some(4096));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.max_upload_bytes, 104_857_600);
        assert_eq!(config.converter.timeout_secs, 120);
        assert_eq!(config.batch.max_parallel_jobs, 4);
        assert_eq!(config.store.sweep_interval_secs, 60);
    }

    #[test]
    fn test_partial_section() {
        let toml = r#"
[batch]
max_parallel_jobs = 16
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.batch.max_parallel_jobs, 16);
        assert_eq!(config.batch.max_files_per_batch, 100);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_config_serializes_to_json() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["server"]["port"], 8080);
        assert_eq!(json["store"]["max_total_bytes"], serde_json::Value::Null);
    }
}
