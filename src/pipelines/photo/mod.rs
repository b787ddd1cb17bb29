// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! CameraFrame → RGBA copy → Compositor → Encoding → EncodedImage
//!                               ↑
//!                  pose image, layout, caption
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Copy**: Strip row padding from the shared frame buffer
//! 2. **Composite**: Layer frame, pose and caption at display size
//! 3. **Encoding**: Convert to JPEG (or PNG)

pub mod caption;
pub mod compositor;
pub mod encoding;

pub use caption::Caption;
pub use compositor::{LayoutParams, MirrorPolicy, OverlayMode};
pub use encoding::{EncodedImage, EncodingFormat, PhotoEncoder};

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use image::RgbaImage;
use tracing::info;

/// Frame to encoded photo
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new(encoder: PhotoEncoder) -> Self {
        Self { encoder }
    }

    /// Composite and encode one photo
    pub fn process(
        &self,
        frame: &CameraFrame,
        pose: Option<&RgbaImage>,
        layout: &LayoutParams,
        caption: &Caption,
    ) -> Result<EncodedImage, PhotoError> {
        let source = frame.to_rgba_image()?;
        let canvas = compositor::render(&source, pose, layout, caption);
        let encoded = self.encoder.encode(&canvas)?;
        info!(
            label = %caption.label,
            slot = caption.slot_index,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.data.len(),
            "Photo processed"
        );
        Ok(encoded)
    }

    pub fn encoder(&self) -> &PhotoEncoder {
        &self.encoder
    }
}
