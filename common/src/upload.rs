//! Image upload policy: validate, compress when over budget, validate again.
//!
//! The same pipeline runs in the browser before anything is sent and on the
//! server before anything is stored:
//!
//! 1. The MIME type must be one of [`ALLOWED_MIME_TYPES`].
//! 2. A file at or under the ceiling is kept byte-for-byte.
//! 3. A larger file is decoded, scaled down to `max_width` (aspect ratio kept,
//!    never upscaled) and re-encoded as JPEG at `jpeg_quality`.
//! 4. If that is still over the ceiling the upload fails with
//!    [`UploadError::TooLarge`]. An oversized file is never passed through.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];
pub const DEFAULT_MAX_KB: u32 = 200;
pub const DEFAULT_MAX_WIDTH: u32 = 1200;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please upload only JPEG, PNG, or WebP images")]
    UnsupportedType(String),
    #[error("Unable to compress image below {max_kb}KB. Please use a smaller image.")]
    TooLarge { max_kb: u32, size: u64 },
    #[error("The selected file is empty")]
    Empty,
    #[error("Could not read image: {0}")]
    Decode(String),
    #[error("Could not encode image: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub max_kb: u32,
    pub max_width: u32,
    pub jpeg_quality: u8,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_kb: DEFAULT_MAX_KB,
            max_width: DEFAULT_MAX_WIDTH,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Image bytes that passed the policy and may be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub compressed: bool,
    pub original_size: u64,
}

impl PreparedImage {
    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime_type)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl UploadPolicy {
    pub fn with_max_kb(max_kb: u32) -> Self {
        Self {
            max_kb,
            ..Self::default()
        }
    }

    pub fn max_bytes(&self) -> u64 {
        u64::from(self.max_kb) * 1024
    }

    /// Rejects anything that is not JPEG, PNG or WebP. Parameters such as
    /// `; charset=` are ignored.
    pub fn check_type(&self, mime_type: &str) -> Result<(), UploadError> {
        let normalized = normalize_mime(mime_type);
        if ALLOWED_MIME_TYPES.contains(&normalized.as_str()) {
            Ok(())
        } else {
            Err(UploadError::UnsupportedType(mime_type.to_string()))
        }
    }

    pub fn fits(&self, size: u64) -> bool {
        size <= self.max_bytes()
    }

    /// Runs the whole validate, compress, validate pipeline.
    pub fn prepare(&self, bytes: Vec<u8>, mime_type: &str) -> Result<PreparedImage, UploadError> {
        self.check_type(mime_type)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let original_size = bytes.len() as u64;

        if self.fits(original_size) {
            let (width, height) = probe_dimensions(&bytes).unzip();
            return Ok(PreparedImage {
                bytes,
                mime_type: canonical_mime(mime_type),
                width,
                height,
                compressed: false,
                original_size,
            });
        }

        let image = image::load_from_memory(&bytes).map_err(|e| UploadError::Decode(e.to_string()))?;
        let scaled = self.scale_down(image);
        let (width, height) = scaled.dimensions();
        let encoded = self.encode_jpeg(&scaled)?;

        let final_size = encoded.len() as u64;
        if !self.fits(final_size) {
            return Err(UploadError::TooLarge {
                max_kb: self.max_kb,
                size: final_size,
            });
        }

        Ok(PreparedImage {
            bytes: encoded,
            mime_type: "image/jpeg".to_string(),
            width: Some(width),
            height: Some(height),
            compressed: true,
            original_size,
        })
    }

    fn scale_down(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        if width <= self.max_width {
            return image;
        }
        let new_height =
            ((u64::from(height) * u64::from(self.max_width)) / u64::from(width)).max(1) as u32;
        image.resize_exact(self.max_width, new_height, FilterType::Triangle)
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>, UploadError> {
        let rgb = image.to_rgb8();
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| UploadError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

/// Reads width and height from the image header without decoding pixels.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

pub fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `image/jpg` is accepted on input but always stored as `image/jpeg`.
fn canonical_mime(mime_type: &str) -> String {
    match normalize_mime(mime_type).as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        other => other.to_string(),
    }
}

pub fn extension_for(mime_type: &str) -> &'static str {
    match normalize_mime(mime_type).as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}
