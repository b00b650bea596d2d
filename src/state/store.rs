use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use super::data::PersistedRecord;
use crate::error::{PipelineError, Result};

/// Name of the catalog file written into the output folder
pub const CATALOG_FILE_NAME: &str = "images.json";

/// Sub-folder of the output folder that receives every screenshot
pub const SCREENSHOT_DIR_NAME: &str = "boris";

/// The CatalogStore owns the on-disk side of an output folder:
/// the screenshot sub-folder and the `images.json` record.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    output_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Get the output folder this store writes into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the screenshot sub-folder
    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join(SCREENSHOT_DIR_NAME)
    }

    /// Path of the catalog file
    pub fn catalog_path(&self) -> PathBuf {
        self.output_dir.join(CATALOG_FILE_NAME)
    }

    /// Make sure the screenshot sub-folder exists.
    /// An existing folder is left untouched.
    pub async fn ensure_screenshot_dir(&self) -> Result<PathBuf> {
        let dir = self.screenshot_dir();
        match fs::create_dir(&dir).await {
            Ok(()) => {
                info!(path = %dir.display(), "Created screenshot folder");
                Ok(dir)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {
                debug!(path = %dir.display(), "Screenshot folder already present");
                Ok(dir)
            }
            Err(e) => Err(PipelineError::io(dir, e)),
        }
    }

    /// Write the record as `images.json`, replacing any previous file.
    ///
    /// The JSON goes to a temporary sibling first and is renamed into place,
    /// so a reader never sees a half-written catalog.
    pub async fn persist(&self, record: &PersistedRecord) -> Result<PathBuf> {
        let path = self.catalog_path();
        let json = serde_json::to_string(record)
            .map_err(|source| PipelineError::unserializable(&path, source))?;

        // Unique per write, so overlapping writers never share a temp file
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| PipelineError::io(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;

        info!(
            path = %path.display(),
            entries = record.images.len(),
            "Catalog written"
        );
        Ok(path)
    }

    /// Read a previously written record.
    ///
    /// `path` may name the catalog file itself or the folder holding it.
    pub async fn load(path: &Path) -> Result<PersistedRecord> {
        let path = if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            path.join(CATALOG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let raw = fs::read(&path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        let record: PersistedRecord = serde_json::from_slice(&raw)
            .map_err(|source| PipelineError::Parse {
                path: path.clone(),
                source,
            })?;

        info!(
            path = %path.display(),
            entries = record.images.len(),
            "Catalog loaded"
        );
        Ok(record)
    }
}
