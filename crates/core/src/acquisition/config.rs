//! Acquisition pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the download-and-convert pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Staging directory for downloaded archives, one file per file id.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Base URL prefixed to host-relative download URLs from the listing.
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,

    /// Timeout for the lightweight existence check, in seconds.
    #[serde(default = "default_head_timeout")]
    pub head_timeout_secs: u64,

    /// Connect timeout for download requests, in seconds. Downloads carry
    /// no overall timeout; large archives take as long as they take.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads/customs")
}

fn default_asset_base_url() -> String {
    "https://rhythmverse.co".to_string()
}

fn default_head_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            asset_base_url: default_asset_base_url(),
            head_timeout_secs: default_head_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.download_dir, PathBuf::from("downloads/customs"));
        assert_eq!(config.head_timeout_secs, 5);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            download_dir = "/var/lib/versehound/staging"
        "#;
        let config: AcquisitionConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.download_dir,
            PathBuf::from("/var/lib/versehound/staging")
        );
        assert_eq!(config.asset_base_url, "https://rhythmverse.co");
    }
}
