//! Mock song converter for testing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::converter::{ConverterError, SongConverter};

/// A recorded converter invocation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Import { archive: PathBuf },
    Package { content_id: String, import_dir: PathBuf },
}

/// Mock implementation of the [`SongConverter`] trait.
///
/// Materializes import directories and package files under a base directory
/// so the pipeline's filesystem cleanup can be observed, and records every
/// invocation.
pub struct MockSongConverter {
    base_dir: PathBuf,
    fail_import: Arc<AtomicBool>,
    fail_package: Arc<AtomicBool>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl MockSongConverter {
    /// Create a mock that materializes its outputs under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            fail_import: Arc::new(AtomicBool::new(false)),
            fail_package: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make import steps fail with a missing completion marker.
    pub fn set_fail_import(&self, fail: bool) {
        self.fail_import.store(fail, Ordering::SeqCst);
    }

    /// Make package steps fail with a missing completion marker.
    pub fn set_fail_package(&self, fail: bool) {
        self.fail_package.store(fail, Ordering::SeqCst);
    }

    /// All invocations recorded so far.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl SongConverter for MockSongConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn import(&self, archive: &Path) -> Result<PathBuf, ConverterError> {
        self.calls.write().await.push(RecordedCall::Import {
            archive: archive.to_path_buf(),
        });

        if self.fail_import.load(Ordering::SeqCst) {
            return Err(ConverterError::MissingMarker { step: "import" });
        }

        let stem = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive".to_string());
        let import_dir = self.base_dir.join(format!("{}-import", stem));
        tokio::fs::create_dir_all(&import_dir).await?;
        Ok(import_dir)
    }

    async fn package(
        &self,
        content_id: &str,
        import_dir: &Path,
    ) -> Result<PathBuf, ConverterError> {
        self.calls.write().await.push(RecordedCall::Package {
            content_id: content_id.to_string(),
            import_dir: import_dir.to_path_buf(),
        });

        if self.fail_package.load(Ordering::SeqCst) {
            return Err(ConverterError::MissingMarker { step: "package" });
        }

        let pkg_path = self.base_dir.join(format!("{}.pkg", content_id));
        tokio::fs::write(&pkg_path, b"mock package").await?;
        Ok(pkg_path)
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
