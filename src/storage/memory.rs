//! In-process local store. Holds the raw JSON so it behaves like the file slot.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{decode_collection, LocalStore};
use crate::listing::Listing;

#[derive(Default)]
pub struct MemoryLocalStore {
    slot: Mutex<Option<String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with arbitrary slot contents, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn load_listings(&self) -> Result<Vec<Listing>> {
        let slot = self.slot.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;
        Ok(slot.as_deref().map(decode_collection).unwrap_or_default())
    }

    async fn save_listings(&self, listings: &[Listing]) -> Result<()> {
        let raw = serde_json::to_string(listings)?;
        let mut slot = self.slot.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;
        *slot = Some(raw);
        Ok(())
    }
}
