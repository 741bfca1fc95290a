//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the Onyx-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the onyx binary.
    #[serde(default = "default_onyx_path")]
    pub onyx_path: PathBuf,

    /// Timeout for a single tool invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_onyx_path() -> PathBuf {
    PathBuf::from("onyx")
}

fn default_timeout() -> u64 {
    600
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            onyx_path: default_onyx_path(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ConverterConfig {
    /// Creates a config pointing at a specific binary.
    pub fn with_path(onyx_path: PathBuf) -> Self {
        Self {
            onyx_path,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.onyx_path, PathBuf::from("onyx"));
        assert_eq!(config.timeout_secs, 600);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            onyx_path = "/opt/onyx/onyx"
        "#;
        let config: ConverterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.onyx_path, PathBuf::from("/opt/onyx/onyx"));
        assert_eq!(config.timeout_secs, 600);
    }
}
