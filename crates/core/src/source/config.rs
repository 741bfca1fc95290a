//! Configuration for the remote listing source.

use serde::{Deserialize, Serialize};

/// Configuration for the remote catalog listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listing endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://rhythmverse.co/api/rb3/songfiles/list".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0)".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
