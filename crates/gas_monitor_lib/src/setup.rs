use std::env;

use crate::config::Config;
use crate::error::AnalyticsError;

pub const DEFAULT_MAX_POOL_SIZE: u32 = 10;
pub const DEFAULT_SLOW_QUERY_THRESHOLD_MS: u64 = 1000;
pub const DEFAULT_HIGH_GAS_THRESHOLD: f64 = 1_000_000.0;
pub const DEFAULT_HTTP_WORKERS: usize = 4;

/// Runtime settings resolved from the config file and the environment.
/// `DB_SQLITE_FILENAME` overrides the configured sqlite path.
#[derive(Clone, Debug)]
pub struct AnalyticsSetup {
    pub db_filename: String,
    pub max_pool_size: u32,
    pub slow_query_threshold_ms: u64,
    pub high_gas_threshold: f64,
    pub listen_addr: String,
    pub http_workers: usize,
}

impl AnalyticsSetup {
    pub fn new(config: &Config) -> Result<Self, AnalyticsError> {
        let db_filename = env::var("DB_SQLITE_FILENAME")
            .unwrap_or_else(|_| config.database.sqlite_file.clone());
        if db_filename.is_empty() {
            return Err(AnalyticsError::OtherError(
                "No sqlite database file configured".to_string(),
            ));
        }

        let high_gas_threshold = config
            .analytics
            .as_ref()
            .and_then(|a| a.high_gas_threshold)
            .unwrap_or(DEFAULT_HIGH_GAS_THRESHOLD);
        if high_gas_threshold < 0.0 {
            return Err(AnalyticsError::OtherError(format!(
                "Invalid high gas threshold: {}",
                high_gas_threshold
            )));
        }

        Ok(AnalyticsSetup {
            db_filename,
            max_pool_size: config
                .database
                .max_pool_size
                .unwrap_or(DEFAULT_MAX_POOL_SIZE),
            slow_query_threshold_ms: config
                .database
                .slow_query_threshold_ms
                .unwrap_or(DEFAULT_SLOW_QUERY_THRESHOLD_MS),
            high_gas_threshold,
            listen_addr: config.server.listen_addr.clone(),
            http_workers: config.server.http_workers.unwrap_or(DEFAULT_HTTP_WORKERS),
        })
    }
}
