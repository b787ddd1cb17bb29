// SPDX-License-Identifier: GPL-3.0-only

//! Still-image frame source for the virtual camera

use crate::backends::camera::types::{BackendError, BackendResult};
use image::RgbaImage;
use std::path::Path;
use tracing::info;

/// Supported image file extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Check if a file extension is a supported image format
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Load an image file as RGBA
pub fn load_image(path: &Path) -> BackendResult<RgbaImage> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from(io),
        other => BackendError::Other(format!(
            "Failed to load image '{}': {}",
            path.display(),
            other
        )),
    })?;

    let rgba = img.to_rgba8();
    info!(width = rgba.width(), height = rgba.height(), "Image loaded successfully");
    Ok(rgba)
}
