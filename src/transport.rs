//! Moves inline photos onto the remote host.
//!
//! Inline entries are decoded, sent in a single multipart request and
//! replaced in place by the returned paths. External entries keep their slot.
//! Any failure hands the input back untouched.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;

use crate::data_url::{DataUrl, DataUrlError};
use crate::listing::ImageRef;
use crate::storage::{RemoteStore, UploadFile};

/// Result of an upload attempt. Both variants carry a usable image list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// Every entry is now an external path (or nothing needed uploading).
    Uploaded(Vec<ImageRef>),
    /// The upload failed; this is the exact input.
    Unchanged(Vec<ImageRef>),
}

impl TransportOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, TransportOutcome::Uploaded(_))
    }

    pub fn into_images(self) -> Vec<ImageRef> {
        match self {
            TransportOutcome::Uploaded(images) | TransportOutcome::Unchanged(images) => images,
        }
    }
}

#[derive(Clone)]
pub struct ImageTransport {
    remote: Arc<dyn RemoteStore>,
}

impl ImageTransport {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    pub async fn upload(&self, images: Vec<ImageRef>) -> TransportOutcome {
        let (slots, urls): (Vec<usize>, Vec<String>) = images
            .iter()
            .enumerate()
            .filter_map(|(i, image)| match image {
                ImageRef::Inline(url) => Some((i, url.clone())),
                ImageRef::External(_) => None,
            })
            .unzip();

        if urls.is_empty() {
            return TransportOutcome::Uploaded(images);
        }

        // Payloads are decoded on blocking workers, joined in input order.
        let stamp = Utc::now().timestamp_millis();
        let tasks = urls.into_iter().enumerate().map(|(n, url)| {
            tokio::task::spawn_blocking(move || to_upload_file(&url, stamp, n))
        });

        let mut files = Vec::with_capacity(slots.len());
        for joined in join_all(tasks).await {
            match joined {
                Ok(Ok(file)) => files.push(file),
                Ok(Err(e)) => {
                    tracing::warn!("Inline photo could not be decoded, skipping upload: {}", e);
                    return TransportOutcome::Unchanged(images);
                }
                Err(e) => {
                    tracing::warn!("Photo decode worker failed, skipping upload: {}", e);
                    return TransportOutcome::Unchanged(images);
                }
            }
        }

        let count = files.len();
        let paths = match self.remote.upload_files(files).await {
            Ok(paths) if paths.len() == count => paths,
            Ok(paths) => {
                tracing::warn!("Upload returned {} paths for {} photos", paths.len(), count);
                return TransportOutcome::Unchanged(images);
            }
            Err(e) => {
                tracing::warn!("Photo upload failed: {:#}", e);
                return TransportOutcome::Unchanged(images);
            }
        };

        let mut out = images;
        for (slot, path) in slots.into_iter().zip(paths) {
            out[slot] = ImageRef::External(path);
        }
        tracing::debug!("Uploaded {} photos", count);
        TransportOutcome::Uploaded(out)
    }
}

fn to_upload_file(url: &str, stamp: i64, index: usize) -> Result<UploadFile, DataUrlError> {
    let data = DataUrl::parse(url)?;
    let file_name = format!("img_{}_{}.{}", stamp, index, data.file_extension());
    Ok(UploadFile {
        file_name,
        mime: data.mime,
        bytes: data.bytes,
    })
}
