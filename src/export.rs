use std::io::Cursor;

use egui::ColorImage;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use log::info;

use crate::error::{ComposerError, Result};

/// Encodes a rendered face as PNG bytes, ready for download or sharing.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    info!(
        "Encoded {}x{} export ({} bytes)",
        image.width(),
        image.height(),
        bytes.len()
    );
    Ok(bytes)
}

/// Scales a whole rendered image for a device pixel ratio.
///
/// Layers are never re-rendered at another resolution; the flattened output is
/// resampled as one piece. A ratio of exactly 1 returns an unchanged copy.
pub fn scale_for_pixel_ratio(image: &RgbaImage, pixel_ratio: f32) -> Result<RgbaImage> {
    if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
        return Err(ComposerError::InvalidPixelRatio(pixel_ratio));
    }
    if pixel_ratio == 1.0 {
        return Ok(image.clone());
    }
    let width = ((image.width() as f32 * pixel_ratio).round() as u32).max(1);
    let height = ((image.height() as f32 * pixel_ratio).round() as u32).max(1);
    Ok(imageops::resize(image, width, height, FilterType::Triangle))
}

/// Converts a rendered face for display in an egui texture.
pub fn to_color_image(image: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    )
}
