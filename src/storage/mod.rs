//! Storage ports for the listing collection.
//!
//! - [`RemoteStore`]: the board's HTTP endpoint (JSON collection + photo uploads)
//! - [`LocalStore`]: a single on-device slot holding the whole collection as JSON
//!
//! The two are independent replicas. [`crate::repository::ListingRepository`]
//! picks one per call and never merges them.

pub mod local;
pub mod memory;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use async_trait::async_trait;

use crate::listing::Listing;

pub use local::FileLocalStore;
pub use memory::MemoryLocalStore;
pub use remote::HttpRemoteStore;

/// A photo ready to be sent to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Network-backed store.
///
/// Every method may fail for any reason (unreachable, bad status, bad body);
/// callers treat all of them the same way.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the full collection, newest first.
    async fn fetch_listings(&self) -> Result<Vec<Listing>>;

    /// Replace the full collection.
    async fn save_listings(&self, listings: &[Listing]) -> Result<()>;

    /// Upload photos in one request. Returns one path per file, in order.
    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<String>>;
}

/// On-device fallback store.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Human-readable backend name (e.g., "file", "memory").
    fn backend_name(&self) -> &str;

    /// Load the collection. Absent or unparsable data loads as empty.
    async fn load_listings(&self) -> Result<Vec<Listing>>;

    /// Replace the collection wholesale.
    async fn save_listings(&self, listings: &[Listing]) -> Result<()>;
}

/// Shared by both local backends: parse the slot, treating garbage as empty.
pub(crate) fn decode_collection(raw: &str) -> Vec<Listing> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(listings) => listings,
        Err(e) => {
            tracing::warn!("Stored listings are corrupt, starting fresh: {}", e);
            Vec::new()
        }
    }
}
