// SPDX-License-Identifier: GPL-3.0-only

//! Caption band and bitmap text rendering
//!
//! Text uses the 8x8 `font8x8` glyphs scaled by an integer factor, so the
//! output is identical on every machine.

use crate::constants::compositing as c;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// Text drawn into the caption band of one photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    /// Pose label (primary line)
    pub label: String,
    /// Zero-based slot of this photo
    pub slot_index: usize,
    /// Number of slots in the session
    pub slot_count: usize,
    /// Optional capture time line
    pub timestamp: Option<String>,
}

impl Caption {
    /// "Photo N of M"
    pub fn counter_text(&self) -> String {
        format!("Photo {} of {}", self.slot_index + 1, self.slot_count)
    }

    /// Total band height including the optional timestamp line
    pub fn band_height(&self) -> u32 {
        if self.timestamp.is_some() {
            c::CAPTION_BAND_HEIGHT + c::TIMESTAMP_LINE_HEIGHT
        } else {
            c::CAPTION_BAND_HEIGHT
        }
    }
}

/// Paint the band and its text lines at the bottom of `canvas`
pub fn draw_caption(canvas: &mut RgbaImage, caption: &Caption) {
    let (width, height) = canvas.dimensions();
    let band_height = caption.band_height().min(height);
    let band_top = height - band_height;

    fill_rect_alpha(
        canvas,
        0,
        band_top,
        width,
        band_height,
        [0, 0, 0],
        c::CAPTION_BAND_ALPHA,
    );

    let center_x = width as i32 / 2;
    let label_baseline = height as i32 - c::LABEL_BASELINE_OFFSET as i32;
    let counter_baseline = height as i32 - c::COUNTER_BASELINE_OFFSET as i32;

    draw_text_centered(
        canvas,
        &caption.label,
        center_x,
        label_baseline,
        c::LABEL_SCALE,
        c::LABEL_COLOR,
        true,
    );
    draw_text_centered(
        canvas,
        &caption.counter_text(),
        center_x,
        counter_baseline,
        c::COUNTER_SCALE,
        c::COUNTER_COLOR,
        false,
    );

    if let Some(timestamp) = &caption.timestamp {
        let baseline = band_top as i32 + 3 + 8 * c::TIMESTAMP_SCALE as i32;
        draw_text_centered(
            canvas,
            timestamp,
            center_x,
            baseline,
            c::TIMESTAMP_SCALE,
            c::TIMESTAMP_COLOR,
            false,
        );
    }
}

/// Width in pixels of `text` at `scale`
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * 8 * scale
}

/// Draw `text` horizontally centred on `center_x` with its baseline at `baseline_y`
pub fn draw_text_centered(
    canvas: &mut RgbaImage,
    text: &str,
    center_x: i32,
    baseline_y: i32,
    scale: u32,
    color: [u8; 4],
    bold: bool,
) {
    let x = center_x - text_width(text, scale) as i32 / 2;
    let y = baseline_y - 8 * scale as i32;
    draw_text(canvas, text, x, y, scale, color);
    if bold {
        // Double-strike one pixel to the right
        draw_text(canvas, text, x + 1, y, scale, color);
    }
}

/// Draw `text` with its top-left corner at (x, y); pixels off the canvas are clipped
pub fn draw_text(canvas: &mut RgbaImage, text: &str, x: i32, y: i32, scale: u32, color: [u8; 4]) {
    let scale_i = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8 * scale_i;
            continue;
        };
        for (row_idx, row_bits) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = y + row_idx as i32 * scale_i;
                for sy in 0..scale_i {
                    for sx in 0..scale_i {
                        put_blended(canvas, px + sx, py + sy, color);
                    }
                }
            }
        }
        cursor_x += 8 * scale_i;
    }
}

/// Blend a solid colour over a rectangle
pub fn fill_rect_alpha(
    canvas: &mut RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    rgb: [u8; 3],
    alpha: f32,
) {
    let x_end = x.saturating_add(width).min(canvas.width());
    let y_end = y.saturating_add(height).min(canvas.height());
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    for py in y..y_end {
        for px in x..x_end {
            put_blended(canvas, px as i32, py as i32, [rgb[0], rgb[1], rgb[2], a]);
        }
    }
}

fn put_blended(canvas: &mut RgbaImage, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    *dst = blend_over(*dst, Rgba(color), 1.0);
}

/// Source-over blend of `src` onto `dst`, with `src` alpha scaled by `opacity`
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let s = src[i] as f32;
        let d = dst[i] as f32;
        out[i] = ((s * sa + d * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(timestamp: Option<&str>) -> Caption {
        Caption {
            label: "Peace Sign".into(),
            slot_index: 1,
            slot_count: 4,
            timestamp: timestamp.map(String::from),
        }
    }

    #[test]
    fn test_counter_text() {
        assert_eq!(caption(None).counter_text(), "Photo 2 of 4");
    }

    #[test]
    fn test_band_darkens_bottom_only() {
        let mut canvas = RgbaImage::from_pixel(200, 120, Rgba([200, 200, 200, 255]));
        draw_caption(&mut canvas, &caption(None));
        // Above the band
        assert_eq!(canvas.get_pixel(0, 59).0, [200, 200, 200, 255]);
        // Inside the band, left edge (no text there)
        let band = canvas.get_pixel(0, 60).0;
        assert_eq!(band, [60, 60, 60, 255]);
    }

    #[test]
    fn test_timestamp_grows_band() {
        assert_eq!(caption(Some("2026-01-01 10:00")).band_height(), 74);
        let mut canvas = RgbaImage::from_pixel(200, 120, Rgba([200, 200, 200, 255]));
        draw_caption(&mut canvas, &caption(Some("x")));
        assert_ne!(canvas.get_pixel(0, 120 - 74).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_text_is_clipped_not_panicking() {
        let mut canvas = RgbaImage::new(10, 10);
        draw_text(&mut canvas, "Wide text", -20, -4, 3, [255, 255, 255, 255]);
        draw_text_centered(&mut canvas, "é", 5, 9, 1, [255, 0, 0, 255], true);
    }

    #[test]
    fn test_blend_over() {
        let dst = Rgba([0, 0, 0, 255]);
        assert_eq!(blend_over(dst, Rgba([255, 255, 255, 255]), 1.0).0, [255, 255, 255, 255]);
        assert_eq!(blend_over(dst, Rgba([200, 100, 0, 255]), 0.5).0, [100, 50, 0, 255]);
        assert_eq!(blend_over(dst, Rgba([255, 255, 255, 0]), 1.0), dst);
    }
}
