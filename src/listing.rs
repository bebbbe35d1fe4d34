//! Listing data model shared by every store.
//!
//! The JSON shape is the one the board has always persisted: a flat object with
//! camelCase keys and `images` as an array of plain strings. A string starting
//! with `data:` is an inline photo, anything else is a path on the remote host.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const INLINE_PREFIX: &str = "data:";
const ID_SUFFIX_LEN: usize = 11;

/// A single photo attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageRef {
    /// Self-describing data URL (`data:<mime>;base64,...`), not yet uploaded.
    Inline(String),
    /// Stable path returned by the remote store's upload endpoint.
    External(String),
}

impl ImageRef {
    pub fn is_inline(&self) -> bool {
        matches!(self, ImageRef::Inline(_))
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        if s.starts_with(INLINE_PREFIX) {
            ImageRef::Inline(s)
        } else {
            ImageRef::External(s)
        }
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        match image {
            ImageRef::Inline(s) | ImageRef::External(s) => s,
        }
    }
}

/// A rental post as persisted by both the remote and the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub location: String,
    /// Free text; never parsed as a number.
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Listing {
    /// Case-insensitive search over location and details.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.location.to_lowercase().contains(&query)
            || self.details.to_lowercase().contains(&query)
    }

    pub fn has_inline_images(&self) -> bool {
        self.images.iter().any(ImageRef::is_inline)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("required field is empty: {0}")]
    MissingField(&'static str),
}

/// What the posting form collects before photos are attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingDraft {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub price: String,
    pub details: String,
}

impl ListingDraft {
    pub fn validate(&self) -> Result<(), ListingError> {
        if self.name.trim().is_empty() {
            return Err(ListingError::MissingField("name"));
        }
        if self.phone.trim().is_empty() {
            return Err(ListingError::MissingField("phone"));
        }
        if self.location.trim().is_empty() {
            return Err(ListingError::MissingField("location"));
        }
        Ok(())
    }

    /// Stamp a fresh id and timestamp onto the draft.
    pub fn into_listing(self, images: Vec<ImageRef>) -> Result<Listing, ListingError> {
        self.validate()?;
        Ok(Listing {
            id: generate_id(),
            contact_name: self.name,
            contact_phone: self.phone,
            location: self.location,
            price: self.price,
            details: self.details,
            images,
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}

/// Time-prefixed id with a random base36 suffix. Collisions are not checked.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::thread_rng().gen();
    let mut suffix = to_base36(suffix);
    suffix.truncate(ID_SUFFIX_LEN);
    format!("{}{}", to_base36(millis), suffix)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
pub(crate) fn sample_listing(id: &str, images: Vec<ImageRef>) -> Listing {
    Listing {
        id: id.to_string(),
        contact_name: format!("Owner {}", id),
        contact_phone: "0812345678".to_string(),
        location: "Chiang Mai".to_string(),
        price: "4500/month".to_string(),
        details: "Near the market".to_string(),
        images,
        timestamp: 1_700_000_000_000,
    }
}
