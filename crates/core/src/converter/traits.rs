//! Trait definition for the converter module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ConverterError;

/// A converter that turns a downloaded song archive into a distributable
/// package via two sequential steps.
#[async_trait]
pub trait SongConverter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Imports a raw archive into the intermediate representation and
    /// returns the directory the tool created.
    async fn import(&self, archive: &Path) -> Result<PathBuf, ConverterError>;

    /// Packages an imported directory into the final package under the
    /// given content id, returning the produced package path.
    async fn package(&self, content_id: &str, import_dir: &Path)
        -> Result<PathBuf, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
