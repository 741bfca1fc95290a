use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::acquisition::AcquisitionConfig;
use crate::converter::ConverterConfig;
use crate::crawler::CrawlerConfig;
use crate::retry::RetryConfig;
use crate::source::SourceConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("versehound.db")
}

/// Daemon mode configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DaemonConfig {
    /// When set, `versehound` keeps running and repeats the
    /// crawl-then-acquire cycle once a day instead of exiting.
    #[serde(default)]
    pub enabled: bool,
}
