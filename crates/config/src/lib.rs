//! Configuration of the canopy service.
//!
//! The configuration is read from a TOML file and can be overridden with
//! environment variables, eg. `CANOPY__AGGREGATOR__QUORUM=5`.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use canopy_core_types::{Votes, DEFAULT_QUORUM};

/// Prefix of the environment variables overriding the configuration file.
pub const ENV_PREFIX: &str = "CANOPY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Canopy configuration options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration options
    #[serde(default)]
    pub server: ServerConfig,

    /// Vote aggregation configuration options
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Tree request storage configuration options
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log configuration options
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration options
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Reject settings which would make the aggregator misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregator.quorum == 0 {
            return Err(ConfigError::Invalid("aggregator.quorum must be at least 1"));
        }

        if self.aggregator.commit_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "aggregator.commit_timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the submission endpoint listens on
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Number of votes a name needs before its type is resolved. Default: 3
    #[serde(default = "default_quorum")]
    pub quorum: Votes,

    /// How long a commit may take before it is reported as failed. Default: 5s
    #[serde(default = "default_commit_timeout", with = "humantime_serde")]
    pub commit_timeout: Duration,
}

fn default_quorum() -> Votes {
    DEFAULT_QUORUM
}

fn default_commit_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            quorum: default_quorum(),
            commit_timeout: default_commit_timeout(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Requests are lost when the process exits
    Memory,

    /// Requests are stored in a redb database file
    #[default]
    Redb,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Database file, relative paths are resolved against the home directory
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: PathBuf::from("data/tree_requests.redb"),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the standalone metrics server
    pub enabled: bool,

    /// Address of the standalone metrics server
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

/// load_config parses the environment variables and loads the provided config file path
/// to create a Config struct.
pub fn load_config(path: impl AsRef<Path>, prefix: Option<&str>) -> Result<Config, ConfigError> {
    let config: Config = ::config::Config::builder()
        .add_source(::config::File::from(path.as_ref()))
        .add_source(
            ::config::Environment::with_prefix(prefix.unwrap_or(ENV_PREFIX))
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;

    Ok(config)
}
