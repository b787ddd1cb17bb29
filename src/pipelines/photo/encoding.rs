// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Turns composited RGBA canvases into file bytes:
//! - JPEG (with quality control, alpha flattened)
//! - PNG (lossless, alpha kept)

use crate::constants::compositing::JPEG_QUALITY;
use crate::errors::PhotoError;
use image::{ImageFormat, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    /// MIME type of the encoded bytes
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }

    /// Pick the format from a file name, defaulting to JPEG
    pub fn from_path(path: &Path) -> Self {
        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Png) => EncodingFormat::Png,
            _ => EncodingFormat::Jpeg,
        }
    }
}

/// Encoded image data ready for saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    quality: u8,
}

impl PhotoEncoder {
    /// JPEG at the default quality
    pub fn new() -> Self {
        Self {
            format: EncodingFormat::Jpeg,
            quality: JPEG_QUALITY,
        }
    }

    pub fn with_quality(quality: u8) -> Self {
        Self {
            format: EncodingFormat::Jpeg,
            quality: quality.clamp(1, 100),
        }
    }

    /// Set encoding format
    pub fn set_format(&mut self, format: EncodingFormat) {
        self.format = format;
    }

    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// JPEG quality (1-100)
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a composited canvas
    pub fn encode(&self, image: &RgbaImage) -> Result<EncodedImage, PhotoError> {
        let data = match self.format {
            EncodingFormat::Jpeg => Self::encode_jpeg(image, self.quality)?,
            EncodingFormat::Png => Self::encode_png(image)?,
        };

        debug!(size = data.len(), format = ?self.format, "Encoding complete");

        Ok(EncodedImage {
            data,
            format: self.format,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Encode image as JPEG
    ///
    /// JPEG has no alpha channel, so the canvas is converted to RGB first.
    fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
        let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);

        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();

        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}
