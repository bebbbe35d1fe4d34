//! File-backed local store: `<data_dir>/<storage_key>.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{decode_collection, LocalStore};
use crate::listing::Listing;

pub struct FileLocalStore {
    path: PathBuf,
}

impl FileLocalStore {
    pub fn new(data_dir: &Path, storage_key: &str) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Self {
            path: data_dir.join(format!("{}.json", storage_key)),
        })
    }

    /// Default location under the platform data directory.
    pub fn default_dir() -> Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Failed to get data directory")?
            .join("rentboard"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    fn backend_name(&self) -> &str {
        "file"
    }

    async fn load_listings(&self) -> Result<Vec<Listing>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", self.path.display(), e);
                return Ok(Vec::new());
            }
        };
        Ok(decode_collection(&raw))
    }

    async fn save_listings(&self, listings: &[Listing]) -> Result<()> {
        let contents =
            serde_json::to_string(listings).context("Failed to serialize listings")?;
        tokio::fs::write(&self.path, contents)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
