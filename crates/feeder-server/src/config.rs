//! Server configuration.

use anyhow::Result;
use feeder_core::DEFAULT_HISTORY_LIMIT;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Front-end assets served for plain HTTP requests.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Seconds between heartbeat pings to every connection.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    /// Snapshots kept per device; 0 disables history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

fn default_ping_interval() -> u64 {
    3
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            ping_interval_secs: default_ping_interval(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    /// Heartbeat period, never shorter than one second.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("port = 9000\nhistory_limit = 10").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.static_dir, PathBuf::from("./public"));
        assert_eq!(config.ping_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_ping_interval_floor() {
        let config = Config {
            ping_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.ping_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("feeder.toml");
        std::fs::write(&path, "host = \"127.0.0.1\"\nstatic_dir = \"/srv/feeder\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.static_dir, PathBuf::from("/srv/feeder"));
        assert_eq!(config.port, 8080);
    }
}
