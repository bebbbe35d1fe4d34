//! The board as its pages see it: browse, search, post with photos, admin removal.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::config::{AdminConfig, Config};
use crate::encoder::{EncodeError, PhotoEncoder};
use crate::environment::ServerEnvironment;
use crate::listing::{ImageRef, Listing, ListingDraft, ListingError};
use crate::repository::ListingRepository;
use crate::storage::{FileLocalStore, HttpRemoteStore};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Invalid(#[from] ListingError),
    #[error(transparent)]
    Image(#[from] EncodeError),
    #[error("admin credentials rejected")]
    Unauthorized,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub passphrase: String,
}

pub struct Board {
    repository: ListingRepository,
    encoder: PhotoEncoder,
    max_images: usize,
    admin: AdminConfig,
}

impl Board {
    pub fn new(repository: ListingRepository, config: &Config) -> Self {
        Self {
            repository,
            encoder: PhotoEncoder::new(config.images.max_width, config.images.quality),
            max_images: config.images.max_per_listing,
            admin: config.admin.clone(),
        }
    }

    /// Wire the HTTP remote store and the file-backed local store from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let endpoint = config.remote.endpoint.clone();
        let local = FileLocalStore::new(&config.data_dir()?, &config.local.storage_key)?;
        let remote = HttpRemoteStore::new(endpoint.clone().unwrap_or_default());
        let repository = ListingRepository::new(
            Arc::new(remote),
            Arc::new(local),
            Arc::new(ServerEnvironment::new(endpoint)),
        );
        tracing::debug!("Board using {} store", repository.backend());
        Ok(Self::new(repository, config))
    }

    pub async fn listings(&self) -> Vec<Listing> {
        self.repository.list().await
    }

    pub async fn search(&self, query: &str) -> Vec<Listing> {
        let mut listings = self.repository.list().await;
        listings.retain(|l| l.matches(query));
        listings
    }

    /// Validate, compress photos, then create. Nothing is persisted if
    /// validation or any photo fails.
    pub async fn post(
        &self,
        draft: ListingDraft,
        mut photos: Vec<Vec<u8>>,
    ) -> Result<Vec<Listing>, BoardError> {
        draft.validate()?;

        if photos.len() > self.max_images {
            tracing::debug!(
                "Dropping {} photos over the limit of {}",
                photos.len() - self.max_images,
                self.max_images
            );
            photos.truncate(self.max_images);
        }

        let encoded = self.encoder.encode_batch(photos).await?;
        let images = encoded.into_iter().map(ImageRef::Inline).collect();
        let listing = draft.into_listing(images)?;

        Ok(self.repository.create(listing).await)
    }

    /// Admin-only delete.
    pub async fn remove(
        &self,
        credentials: &AdminCredentials,
        id: &str,
    ) -> Result<Vec<Listing>, BoardError> {
        if !self.is_admin(credentials) {
            tracing::warn!("Rejected delete of {} for user {:?}", id, credentials.user);
            return Err(BoardError::Unauthorized);
        }
        Ok(self.repository.delete(id).await)
    }

    fn is_admin(&self, credentials: &AdminCredentials) -> bool {
        match &self.admin.passphrase {
            Some(passphrase) => {
                credentials.user == self.admin.user && &credentials.passphrase == passphrase
            }
            None => false,
        }
    }
}
