//! Crawl scheduler configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the crawl scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Exclusive upper bound on page numbers to attempt.
    #[serde(default = "default_max_page")]
    pub max_page: u64,

    /// Number of pages processed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Consecutive caught-up pages before the run stops scheduling new work.
    #[serde(default = "default_caught_up_threshold")]
    pub caught_up_threshold: u32,

    /// Where the crash-resume progress artifact is written.
    #[serde(default = "default_progress_path")]
    pub progress_path: PathBuf,
}

fn default_max_page() -> u64 {
    100_000
}

fn default_concurrency() -> usize {
    8
}

fn default_caught_up_threshold() -> u32 {
    5
}

fn default_progress_path() -> PathBuf {
    PathBuf::from("progress.json")
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_page: default_max_page(),
            concurrency: default_concurrency(),
            caught_up_threshold: default_caught_up_threshold(),
            progress_path: default_progress_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_page, 100_000);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.caught_up_threshold, 5);
        assert_eq!(config.progress_path, PathBuf::from("progress.json"));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            concurrency = 16
            caught_up_threshold = 3
        "#;
        let config: CrawlerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.caught_up_threshold, 3);
        assert_eq!(config.max_page, 100_000);
    }
}
