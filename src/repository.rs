//! Listing repository: picks a store per call and degrades to local storage.
//!
//! Remote and local are never merged. When the environment says the remote
//! store is available it is tried first; any failure falls back to the local
//! slot. None of the operations return an error.

use std::sync::Arc;

use crate::environment::Environment;
use crate::listing::Listing;
use crate::storage::{LocalStore, RemoteStore};
use crate::transport::{ImageTransport, TransportOutcome};

pub struct ListingRepository {
    remote: Arc<dyn RemoteStore>,
    local: Arc<dyn LocalStore>,
    environment: Arc<dyn Environment>,
    transport: ImageTransport,
}

impl ListingRepository {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        environment: Arc<dyn Environment>,
    ) -> Self {
        let transport = ImageTransport::new(remote.clone());
        Self {
            remote,
            local,
            environment,
            transport,
        }
    }

    /// Which store would serve a request right now.
    pub fn backend(&self) -> &str {
        if self.environment.remote_available() {
            "remote"
        } else {
            self.local.backend_name()
        }
    }

    /// Current collection, newest first. Worst case is empty.
    pub async fn list(&self) -> Vec<Listing> {
        if self.environment.remote_available() {
            match self.remote.fetch_listings().await {
                Ok(listings) => return listings,
                Err(e) => tracing::warn!("Remote store unavailable, using local listings: {:#}", e),
            }
        }
        self.load_local().await
    }

    /// Prepend `listing` and persist. Returns the collection actually persisted.
    ///
    /// On the remote path inline photos are uploaded first. If the upload or
    /// the save fails, the original listing (photos still inline) is prepended
    /// to the original collection and written locally instead.
    pub async fn create(&self, listing: Listing) -> Vec<Listing> {
        let current = self.list().await;

        if self.environment.remote_available() {
            match self.transport.upload(listing.images.clone()).await {
                TransportOutcome::Uploaded(images) => {
                    let uploaded = Listing {
                        images,
                        ..listing.clone()
                    };
                    let updated = prepend(uploaded, &current);
                    match self.remote.save_listings(&updated).await {
                        Ok(()) => {
                            tracing::info!("Listing {} saved to remote store", listing.id);
                            return updated;
                        }
                        Err(e) => tracing::warn!("Remote save failed, saving locally: {:#}", e),
                    }
                }
                TransportOutcome::Unchanged(_) => {
                    tracing::warn!("Photos for listing {} not uploaded, saving locally", listing.id);
                }
            }
        }

        let updated = prepend(listing, &current);
        self.save_local(&updated).await;
        updated
    }

    /// Remove the listing with `id`. The filtered collection is returned even
    /// if no store accepted the write.
    pub async fn delete(&self, id: &str) -> Vec<Listing> {
        let current = self.list().await;
        let updated: Vec<Listing> = current.into_iter().filter(|l| l.id != id).collect();

        if self.environment.remote_available() {
            match self.remote.save_listings(&updated).await {
                Ok(()) => {
                    tracing::info!("Listing {} deleted from remote store", id);
                    return updated;
                }
                Err(e) => tracing::warn!("Remote delete failed, saving locally: {:#}", e),
            }
        }

        self.save_local(&updated).await;
        updated
    }

    async fn load_local(&self) -> Vec<Listing> {
        match self.local.load_listings().await {
            Ok(listings) => listings,
            Err(e) => {
                tracing::warn!("Could not read {} store: {:#}", self.local.backend_name(), e);
                Vec::new()
            }
        }
    }

    async fn save_local(&self, listings: &[Listing]) {
        if let Err(e) = self.local.save_listings(listings).await {
            tracing::warn!("Could not write {} store: {:#}", self.local.backend_name(), e);
        }
    }
}

fn prepend(listing: Listing, current: &[Listing]) -> Vec<Listing> {
    let mut updated = Vec::with_capacity(current.len() + 1);
    updated.push(listing);
    updated.extend_from_slice(current);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_url::DataUrl;
    use crate::listing::{sample_listing, ImageRef};
    use crate::storage::testing::{FailingLocal, FakeRemote};
    use crate::storage::MemoryLocalStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Harness {
        remote: Arc<FakeRemote>,
        local: Arc<MemoryLocalStore>,
        online: Arc<AtomicBool>,
        repo: ListingRepository,
    }

    fn harness(online: bool) -> Harness {
        let remote = Arc::new(FakeRemote::default());
        let local = Arc::new(MemoryLocalStore::new());
        let flag = Arc::new(AtomicBool::new(online));
        let reachable = {
            let flag = flag.clone();
            move || flag.load(Ordering::SeqCst)
        };
        let repo = ListingRepository::new(remote.clone(), local.clone(), Arc::new(reachable));
        Harness {
            remote,
            local,
            online: flag,
            repo,
        }
    }

    fn inline(byte: u8) -> ImageRef {
        ImageRef::Inline(DataUrl::encode("image/jpeg", &[byte, byte]))
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_creates_are_listed_newest_first() {
        for online in [true, false] {
            let h = harness(online);
            for id in ["1", "2", "3"] {
                h.repo.create(sample_listing(id, vec![])).await;
            }
            assert_eq!(ids(&h.repo.list().await), vec!["3", "2", "1"]);
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_id_returns_collection_unchanged() {
        let h = harness(false);
        h.repo.create(sample_listing("1", vec![])).await;
        let before = h.repo.list().await;

        let after = h.repo.delete("nope").await;

        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_remote_create_uploads_inline_photos_in_order() {
        let h = harness(true);
        let listing = sample_listing(
            "1",
            vec![inline(1), ImageRef::External("uploads/kept.jpg".into()), inline(2)],
        );

        let returned = h.repo.create(listing).await;

        let expected = vec![
            ImageRef::External("uploads/0.jpg".into()),
            ImageRef::External("uploads/kept.jpg".into()),
            ImageRef::External("uploads/1.jpg".into()),
        ];
        assert_eq!(returned[0].images, expected);
        let listed = h.repo.list().await;
        assert_eq!(listed[0].images, expected);
        assert!(!listed[0].has_inline_images());
        assert!(h.local.raw().is_none(), "local store untouched");
    }

    #[tokio::test]
    async fn test_remote_save_failure_falls_back_with_inline_photos() {
        let h = harness(true);
        h.remote.listings.lock().unwrap().push(sample_listing("old", vec![]));
        h.remote.fail_save.store(true, Ordering::SeqCst);
        let listing = sample_listing("new", vec![inline(7)]);

        let returned = h.repo.create(listing.clone()).await;

        assert_eq!(ids(&returned), vec!["new", "old"]);
        assert_eq!(returned[0], listing, "photos stay inline");
        assert_eq!(h.remote.upload_count(), 1);

        h.online.store(false, Ordering::SeqCst);
        assert_eq!(h.repo.list().await, returned);
    }

    #[tokio::test]
    async fn test_upload_failure_falls_back_to_local() {
        let h = harness(true);
        h.remote.fail_upload.store(true, Ordering::SeqCst);
        let listing = sample_listing("new", vec![inline(3)]);

        let returned = h.repo.create(listing.clone()).await;

        assert_eq!(returned, vec![listing]);
        assert!(h.remote.stored().is_empty(), "remote collection not rewritten");
        assert!(h.local.raw().unwrap().contains("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_remote_read_failure_uses_local_collection() {
        let h = harness(false);
        h.repo.create(sample_listing("local", vec![])).await;
        h.remote.listings.lock().unwrap().push(sample_listing("remote", vec![]));

        h.online.store(true, Ordering::SeqCst);
        assert_eq!(ids(&h.repo.list().await), vec!["remote"]);

        h.remote.fail_fetch.store(true, Ordering::SeqCst);
        assert_eq!(ids(&h.repo.list().await), vec!["local"]);
    }

    #[tokio::test]
    async fn test_offline_never_touches_remote() {
        let h = harness(false);
        let created = h.repo.create(sample_listing("1", vec![inline(1)])).await;
        h.repo.list().await;
        h.repo.delete(&created[0].id).await;

        assert_eq!(h.remote.call_count(), 0);
        assert_eq!(h.repo.backend(), "memory");
    }

    #[tokio::test]
    async fn test_remote_delete_failure_persists_locally() {
        let h = harness(true);
        h.remote.listings.lock().unwrap().extend([
            sample_listing("a", vec![]),
            sample_listing("b", vec![]),
        ]);
        h.remote.fail_save.store(true, Ordering::SeqCst);

        let returned = h.repo.delete("a").await;

        assert_eq!(ids(&returned), vec!["b"]);
        assert_eq!(ids(&h.remote.stored()), vec!["a", "b"]);
        h.online.store(false, Ordering::SeqCst);
        assert_eq!(ids(&h.repo.list().await), vec!["b"]);
    }

    fn unwritable_board() -> (Arc<FakeRemote>, Arc<FailingLocal>, ListingRepository) {
        let remote = Arc::new(FakeRemote::default());
        remote.listings.lock().unwrap().extend([
            sample_listing("a", vec![]),
            sample_listing("b", vec![]),
        ]);
        remote.fail_save.store(true, Ordering::SeqCst);
        let local = Arc::new(FailingLocal::default());
        let repo = ListingRepository::new(remote.clone(), local.clone(), Arc::new(|| true));
        (remote, local, repo)
    }

    #[tokio::test]
    async fn test_delete_returns_filtered_collection_when_no_store_accepts_write() {
        let (remote, local, repo) = unwritable_board();

        let returned = repo.delete("a").await;

        assert_eq!(ids(&returned), vec!["b"]);
        assert_eq!(ids(&remote.stored()), vec!["a", "b"]);
        assert_eq!(local.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_returns_prepended_collection_when_no_store_accepts_write() {
        let (remote, local, repo) = unwritable_board();
        let listing = sample_listing("n", vec![inline(5)]);

        let returned = repo.create(listing.clone()).await;

        assert_eq!(ids(&returned), vec!["n", "a", "b"]);
        assert_eq!(returned[0], listing, "photos stay inline");
        assert_eq!(ids(&remote.stored()), vec!["a", "b"]);
        assert_eq!(local.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_local_store_offline_lists_empty() {
        let repo = ListingRepository::new(
            Arc::new(FakeRemote::default()),
            Arc::new(FailingLocal::default()),
            Arc::new(|| false),
        );

        assert!(repo.list().await.is_empty());
        let created = repo.create(sample_listing("x", vec![])).await;
        assert_eq!(ids(&created), vec!["x"]);
    }

    #[tokio::test]
    async fn test_corrupt_local_data_lists_empty() {
        let local = Arc::new(MemoryLocalStore::with_raw("<html>oops</html>"));
        let repo = ListingRepository::new(
            Arc::new(FakeRemote::default()),
            local,
            Arc::new(|| false),
        );
        assert!(repo.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_local_only_create_then_delete_scenario() {
        let h = harness(false);
        let listing = crate::listing::ListingDraft {
            name: "A".into(),
            phone: "000".into(),
            location: "X".into(),
            ..Default::default()
        }
        .into_listing(vec![])
        .unwrap();

        h.repo.create(listing).await;
        let listed = h.repo.list().await;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].images.is_empty());
        assert!(!listed[0].id.is_empty());
        assert!(listed[0].timestamp > 0);

        h.repo.delete(&listed[0].id).await;
        assert!(h.repo.list().await.is_empty());
    }
}
