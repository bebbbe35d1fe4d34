//! Photo compression: decode, bound the width, re-encode as JPEG data URL.

use std::io::Cursor;

use futures_util::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use thiserror::Error;

use crate::data_url::DataUrl;

pub const DEFAULT_MAX_WIDTH: u32 = 1000;
pub const DEFAULT_QUALITY: f32 = 0.8;

const OUTPUT_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("could not decode photo: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode photo: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    pub max_width: u32,
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl PhotoEncoder {
    pub fn new(max_width: u32, quality: f32) -> Self {
        Self { max_width, quality }
    }

    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Compress one photo into an inline `data:image/jpeg;base64,...` string.
    pub fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError> {
        let img = decode_upright(bytes).map_err(EncodeError::Decode)?;
        let (width, height) = (img.width(), img.height());
        let (target_w, target_h) = bounded_dimensions(width, height, self.max_width);

        if target_w == 0 || target_h == 0 {
            return Err(EncodeError::Encode(format!(
                "cannot draw a {}x{} bitmap",
                target_w, target_h
            )));
        }

        let img = if (target_w, target_h) != (width, height) {
            img.resize_exact(target_w, target_h, FilterType::Triangle)
        } else {
            img
        };

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality());
        rgb.write_with_encoder(encoder)
            .map_err(|e| EncodeError::Encode(e.to_string()))?;

        Ok(DataUrl::encode(OUTPUT_MIME, &buf))
    }

    /// Encode several photos concurrently. Output order matches input order;
    /// the first failure fails the whole batch.
    pub async fn encode_batch(&self, photos: Vec<Vec<u8>>) -> Result<Vec<String>, EncodeError> {
        let encoder = *self;
        let tasks = photos
            .into_iter()
            .map(|bytes| tokio::task::spawn_blocking(move || encoder.encode(&bytes)));

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(EncodeError::Encode(format!("encoder worker failed: {e}"))),
            })
            .collect()
    }
}

/// Decode and rotate/flip per the EXIF orientation tag, so width means the
/// width the photo is viewed at.
fn decode_upright(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Cap the width at `max_width`, scaling height by the same ratio.
fn bounded_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scale = max_width as f64 / width as f64;
    let scaled_height = (height as f64 * scale).round().max(1.0) as u32;
    (max_width, scaled_height)
}
