//! Onyx-based converter implementation.
//!
//! Onyx reports produced files on stdout behind a fixed completion marker;
//! the exit code alone is not enough to locate the output, so both steps
//! pattern-match the marker and treat its absence as a retryable failure.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::SongConverter;

static CREATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Done! Created files:\s*(.*)").unwrap());
static CREATED_PKG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Done! Created files:\s*(.*\.pkg)").unwrap());

/// Converter backed by the pre-installed `onyx` command-line tool.
pub struct OnyxConverter {
    config: ConverterConfig,
}

impl OnyxConverter {
    /// Creates a new converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Extracts the path behind the import-step completion marker.
    pub fn created_path(stdout: &str) -> Option<PathBuf> {
        CREATED_RE
            .captures(stdout)
            .and_then(|c| c.get(1))
            .map(|m| PathBuf::from(m.as_str().trim()))
    }

    /// Extracts the `.pkg` path behind the package-step completion marker.
    pub fn created_pkg_path(stdout: &str) -> Option<PathBuf> {
        CREATED_PKG_RE
            .captures(stdout)
            .and_then(|c| c.get(1))
            .map(|m| PathBuf::from(m.as_str().trim()))
    }

    /// Runs the tool once and returns its stdout.
    async fn run_tool(&self, args: &[&str]) -> Result<String, ConverterError> {
        debug!(tool = %self.config.onyx_path.display(), ?args, "invoking converter");

        let result = timeout(
            Duration::from_secs(self.config.timeout_secs),
            Command::new(&self.config.onyx_path)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Err(_) => {
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConverterError::ToolNotFound {
                    path: self.config.onyx_path.clone(),
                })
            }
            Ok(Err(e)) => return Err(ConverterError::Io(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ConverterError::tool_failure(
                format!("onyx exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl SongConverter for OnyxConverter {
    fn name(&self) -> &str {
        "onyx"
    }

    async fn import(&self, archive: &Path) -> Result<PathBuf, ConverterError> {
        let stdout = self
            .run_tool(&["import", &archive.to_string_lossy()])
            .await?;

        Self::created_path(&stdout).ok_or(ConverterError::MissingMarker { step: "import" })
    }

    async fn package(
        &self,
        content_id: &str,
        import_dir: &Path,
    ) -> Result<PathBuf, ConverterError> {
        let stdout = self
            .run_tool(&["pkg", content_id, &import_dir.to_string_lossy()])
            .await?;

        Self::created_pkg_path(&stdout).ok_or(ConverterError::MissingMarker { step: "package" })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let result = Command::new(&self.config.onyx_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConverterError::ToolNotFound {
                    path: self.config.onyx_path.clone(),
                })
            }
            Err(e) => Err(ConverterError::Io(e)),
            // Exit status is irrelevant here, only reachability matters.
            Ok(_) => Ok(()),
        }
    }
}
