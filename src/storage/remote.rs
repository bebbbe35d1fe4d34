//! HTTP remote store.
//!
//! One endpoint serves everything:
//!
//! ```text
//! GET  <endpoint>                        → JSON array of listings
//! POST <endpoint>  application/json      → replace the whole collection
//! POST <endpoint>  multipart files[]     → { "paths": ["uploads/…", …] }
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, multipart, Client as HttpClient};
use serde::Deserialize;

use super::{RemoteStore, UploadFile};
use crate::listing::Listing;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    paths: Vec<String>,
}

pub struct HttpRemoteStore {
    endpoint: String,
    http_client: HttpClient,
}

impl HttpRemoteStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client: HttpClient::new(),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        let resp = self
            .http_client
            .get(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .context("Listing fetch failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Listing fetch failed with status: {}", status);
        }

        let body = resp.bytes().await.context("Failed to read listing response")?;
        let listings: Vec<Listing> =
            serde_json::from_slice(&body).context("Listing response is not an array of listings")?;
        Ok(listings)
    }

    async fn save_listings(&self, listings: &[Listing]) -> Result<()> {
        let resp = self
            .http_client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .json(listings)
            .send()
            .await
            .context("Listing save failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Listing save failed with status: {}", status);
        }
        Ok(())
    }

    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<String>> {
        let expected = files.len();
        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .with_context(|| format!("Invalid mime type: {}", file.mime))?;
            form = form.part("files[]", part);
        }

        let resp = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("Photo upload failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Photo upload failed with status: {}", status);
        }

        let body = resp.bytes().await.context("Failed to read upload response")?;
        let uploaded: UploadResponse =
            serde_json::from_slice(&body).context("Upload response has no paths")?;

        if uploaded.paths.len() != expected {
            bail!(
                "Upload returned {} paths for {} files",
                uploaded.paths.len(),
                expected
            );
        }
        Ok(uploaded.paths)
    }
}
