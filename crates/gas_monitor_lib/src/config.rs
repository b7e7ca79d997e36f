use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::AnalyticsError;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub database: Database,
    pub server: Server,
    pub analytics: Option<Analytics>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Database {
    pub sqlite_file: String,
    pub max_pool_size: Option<u32>,
    pub slow_query_threshold_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Server {
    pub listen_addr: String,
    pub http_workers: Option<usize>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Analytics {
    pub high_gas_threshold: Option<f64>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalyticsError> {
        match toml::from_slice(&fs::read(path)?) {
            Ok(config) => Ok(config),
            Err(e) => Err(AnalyticsError::ParsingError(format!(
                "Failed to parse toml {:?}",
                e
            ))),
        }
    }
}
