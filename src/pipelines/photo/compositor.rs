// SPDX-License-Identifier: GPL-3.0-only

//! Frame compositor
//!
//! Builds one output image from a camera frame, an optional pose image and
//! the caption text. Layers, bottom to top:
//!
//! ```text
//! 1. pose backdrop      (Backdrop mode only, cover-fit, opaque)
//! 2. camera frame       (cover-fit, centre-cropped, optionally mirrored)
//! 3. pose reference     (ReferenceOverlay mode only, contain-fit, 70 % opacity)
//! 4. caption band       (bottom, 60 px + optional timestamp line)
//! ```
//!
//! The output always has the display dimensions, so what is saved matches
//! what the user saw in the preview.

use super::caption::{self, Caption};
use crate::constants::compositing as c;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the pose image is placed relative to the camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayMode {
    /// Semi-transparent pose drawn over the frame as a guide
    #[default]
    ReferenceOverlay,
    /// Pose fills the canvas beneath the frame
    Backdrop,
}

/// Whether the saved photo follows the mirrored preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MirrorPolicy {
    /// Saved photo is mirrored exactly when the preview is
    #[default]
    MatchPreview,
    /// Saved photo is never mirrored
    RawSensor,
}

impl MirrorPolicy {
    pub fn applies(self, preview_mirrored: bool) -> bool {
        match self {
            Self::MatchPreview => preview_mirrored,
            Self::RawSensor => false,
        }
    }
}

/// Output geometry and layering for one render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    pub display_width: u32,
    pub display_height: u32,
    pub overlay_mode: OverlayMode,
    /// Flip the camera layer horizontally about the canvas centre
    pub mirrored: bool,
}

impl LayoutParams {
    pub fn new(display_width: u32, display_height: u32) -> Self {
        Self {
            display_width,
            display_height,
            overlay_mode: OverlayMode::default(),
            mirrored: false,
        }
    }
}

/// Scaled size and offset of a source image on a target area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Scale so the source covers the target; the overflow is split evenly
pub fn cover_fit(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Placement {
    let scale = (dst_w as f32 / src_w.max(1) as f32).max(dst_h as f32 / src_h.max(1) as f32);
    place(src_w, src_h, dst_w, dst_h, scale, true)
}

/// Scale so the whole source fits inside the target, centred
pub fn contain_fit(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Placement {
    let scale = (dst_w as f32 / src_w.max(1) as f32).min(dst_h as f32 / src_h.max(1) as f32);
    place(src_w, src_h, dst_w, dst_h, scale, false)
}

fn place(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, scale: f32, cover: bool) -> Placement {
    let mut width = ((src_w as f32 * scale).round() as u32).max(1);
    let mut height = ((src_h as f32 * scale).round() as u32).max(1);
    if cover {
        width = width.max(dst_w);
        height = height.max(dst_h);
    } else {
        width = width.min(dst_w.max(1));
        height = height.min(dst_h.max(1));
    }
    Placement {
        scale,
        width,
        height,
        offset_x: (dst_w as i64 - width as i64) / 2,
        offset_y: (dst_h as i64 - height as i64) / 2,
    }
}

/// Render the layered output image
///
/// Pure function of its inputs. A pose image with zero width or height is
/// treated as absent.
pub fn render(
    frame: &RgbaImage,
    pose: Option<&RgbaImage>,
    layout: &LayoutParams,
    caption: &Caption,
) -> RgbaImage {
    let width = layout.display_width.max(1);
    let height = layout.display_height.max(1);
    let pose = pose.filter(|p| p.width() > 0 && p.height() > 0);

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

    if let (OverlayMode::Backdrop, Some(pose)) = (layout.overlay_mode, pose) {
        let backdrop = cover_crop(pose, width, height);
        imageops::overlay(&mut canvas, &backdrop, 0, 0);
    }

    if frame.width() > 0 && frame.height() > 0 {
        let mut camera = cover_crop(frame, width, height);
        if layout.mirrored {
            imageops::flip_horizontal_in_place(&mut camera);
        }
        imageops::overlay(&mut canvas, &camera, 0, 0);
    }

    if let (OverlayMode::ReferenceOverlay, Some(pose)) = (layout.overlay_mode, pose) {
        draw_reference(&mut canvas, pose);
    }

    caption::draw_caption(&mut canvas, caption);

    debug!(
        width,
        height,
        mode = ?layout.overlay_mode,
        mirrored = layout.mirrored,
        "Composited photo"
    );
    canvas
}

/// Cover-fit `src` onto a `width`×`height` area and crop the overflow
fn cover_crop(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let placement = cover_fit(src.width(), src.height(), width, height);
    let resized = imageops::resize(src, placement.width, placement.height, FilterType::Triangle);
    let crop_x = (-placement.offset_x).max(0) as u32;
    let crop_y = (-placement.offset_y).max(0) as u32;
    imageops::crop_imm(&resized, crop_x, crop_y, width, height).to_image()
}

/// Pose guide: contain-fit inside a centred square, blended at reduced opacity
fn draw_reference(canvas: &mut RgbaImage, pose: &RgbaImage) {
    let (width, height) = canvas.dimensions();
    let side = ((width.min(height) as f32 * c::OVERLAY_SIZE_RATIO).round() as u32).max(1);
    let box_x = (width as i64 - side as i64) / 2;
    let box_y = (height as i64 - side as i64) / 2;

    let placement = contain_fit(pose.width(), pose.height(), side, side);
    let scaled = imageops::resize(pose, placement.width, placement.height, FilterType::Triangle);
    let origin_x = box_x + placement.offset_x;
    let origin_y = box_y + placement.offset_y;

    for (x, y, src) in scaled.enumerate_pixels() {
        let cx = origin_x + x as i64;
        let cy = origin_y + y as i64;
        if cx < 0 || cy < 0 || cx >= width as i64 || cy >= height as i64 {
            continue;
        }
        let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
        *dst = caption::blend_over(*dst, *src, c::OVERLAY_ALPHA);
    }
}
