//! logicsrv configuration

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional YAML seed file of machine_id -> logic entries
    #[serde(default)]
    pub seed_file: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8001
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            seed_file: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file and `LOGICSRV_` env overrides
    pub fn load(path: Option<&str>) -> Result<Self> {
        Figment::new()
            .merge(Yaml::file(path.unwrap_or("config/logicsrv.yaml")))
            .merge(Env::prefixed("LOGICSRV_"))
            .extract()
            .context("Failed to load configuration")
    }
}
