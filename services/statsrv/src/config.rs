//! statsrv configuration

use anyhow::{Context, Result};
use errors::PulseError;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name used in logs
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Number of concurrent event workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}

fn default_service_name() -> String {
    "statsrv".to_string()
}

fn default_worker_count() -> usize {
    4
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            worker_count: default_worker_count(),
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

/// Rule-storage service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicApiConfig {
    /// Base URL of logicsrv
    #[serde(default = "default_logic_api_url")]
    pub url: String,

    /// Rule cache TTL in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Rule fetch timeout in seconds
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
}

fn default_logic_api_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_fetch_timeout_seconds() -> u64 {
    5
}

impl Default for LogicApiConfig {
    fn default() -> Self {
        Self {
            url: default_logic_api_url(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
        }
    }
}

/// Queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Inbound event queue name
    #[serde(default = "default_input_queue")]
    pub input: String,

    /// Outbound status queue name
    #[serde(default = "default_output_queue")]
    pub output: String,

    /// Blocking fetch timeout in seconds (also the shutdown latency bound)
    #[serde(default = "default_block_timeout_seconds")]
    pub block_timeout_seconds: f64,
}

fn default_input_queue() -> String {
    pulse_rtdb::keyspace::INPUT_QUEUE.to_string()
}

fn default_output_queue() -> String {
    pulse_rtdb::keyspace::OUTPUT_QUEUE.to_string()
}

fn default_block_timeout_seconds() -> f64 {
    1.0
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            input: default_input_queue(),
            output: default_output_queue(),
            block_timeout_seconds: default_block_timeout_seconds(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub logic_api: LogicApiConfig,

    #[serde(default)]
    pub queues: QueueConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from YAML file and `STATSRV_` env overrides
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Yaml::file(path.unwrap_or("config/statsrv.yaml")))
            .merge(Env::prefixed("STATSRV_").split("__"))
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.service.worker_count == 0 {
            return Err(PulseError::InvalidConfig {
                field: "service.worker_count".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.queues.input == self.queues.output {
            return Err(PulseError::InvalidConfig {
                field: "queues".to_string(),
                reason: "input and output queues must differ".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.logic_api.cache_ttl_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.logic_api.fetch_timeout_seconds)
    }
}
