// packages/engine/src/utils/config.rs
//! Layered simulator configuration
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file passed with `--config`
//! 3. Environment variables prefixed `ATC_SIM`, e.g. `ATC_SIM__CHANNEL__KEY_PATH`

use crate::runway::service::ServiceTimes;
use crate::utils::errors::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub channel: ChannelConfig,
    pub service: ServiceConfig,
    pub log: LogConfig,
    pub metrics: MetricsConfig,
}

/// Where actors find the shared channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Well-known channel name (in-process registry key)
    pub name: String,

    /// File used to derive the System V IPC key
    pub key_path: PathBuf,

    /// Project byte mixed into the IPC key
    pub project_id: u8,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "atc-sim".to_string(),
            key_path: PathBuf::from("/tmp/atc-sim.channel"),
            project_id: b'Z',
        }
    }
}

/// Simulated service durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub boarding_ms: u64,
    pub landing_ms: u64,
    pub deboarding_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            boarding_ms: 3000,
            landing_ms: 2000,
            deboarding_ms: 3000,
        }
    }
}

impl ServiceConfig {
    pub fn service_times(&self) -> ServiceTimes {
        ServiceTimes {
            boarding: Duration::from_millis(self.boarding_ms),
            landing: Duration::from_millis(self.landing_ms),
            deboarding: Duration::from_millis(self.deboarding_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append-only departure notice file
    pub flight_log_path: PathBuf,

    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            flight_log_path: PathBuf::from("AirTrafficController.txt"),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder
    pub enabled: bool,
}

impl SimConfig {
    /// Load configuration from defaults and the environment only
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an optional file under the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration file {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix("ATC_SIM").separator("__"));

        let config: SimConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.channel.name, "atc-sim");
        assert_eq!(config.channel.project_id, b'Z');
        assert_eq!(config.service.boarding_ms, 3000);
        assert_eq!(
            config.log.flight_log_path,
            PathBuf::from("AirTrafficController.txt")
        );
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_service_times() {
        let times = ServiceConfig::default().service_times();
        assert_eq!(times.boarding, Duration::from_secs(3));
        assert_eq!(times.landing, Duration::from_secs(2));
        assert_eq!(times.deboarding, Duration::from_secs(3));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[channel]\nname = \"tower-7\"\n\n[service]\nboarding_ms = 10\n\n[metrics]\nenabled = true"
        )
        .unwrap();

        let config = SimConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.channel.name, "tower-7");
        assert_eq!(config.service.boarding_ms, 10);
        // Unset keys keep their defaults
        assert_eq!(config.service.landing_ms, 2000);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = SimConfig::load_from(Some(Path::new("/nonexistent/atc-sim.toml")));
        assert!(result.is_err());
    }
}
