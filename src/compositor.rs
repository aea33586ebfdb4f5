//! Flattens the face and its accessories into a single raster.
//!
//! Rendering is a pure function of its inputs: every call starts from a fresh
//! buffer, so rendering the same model twice yields identical pixels.

use egui::{Color32, Pos2, Vec2};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;

use crate::catalog::{AssetCatalog, AssetRef};
use crate::config::ComposerConfig;
use crate::face::{Background, FaceState};
use crate::layer::AccessoryLayer;

/// Renders the face and `layers` (in paint order) at the canvas' logical size.
///
/// Paint order, bottom to top: background color, background image, silhouette,
/// eyes, mouth, accessories by ascending z-index. Assets that are unknown or
/// not yet resident are skipped; rendering itself never fails.
pub fn render(
    face: &FaceState,
    layers: &[AccessoryLayer],
    catalog: &AssetCatalog,
    config: &ComposerConfig,
) -> RgbaImage {
    let (width, height) = (config.canvas.width, config.canvas.height);

    let mut canvas = match face.background() {
        Background::Transparent => RgbaImage::new(width, height),
        Background::Color(color) => RgbaImage::from_pixel(width, height, to_rgba(color)),
    };

    if let Some(asset) = face.background_image() {
        if let Some(image) = resident(catalog, asset) {
            if image.dimensions() == (width, height) {
                composite_over(&mut canvas, image, 0, 0);
            } else {
                let stretched = imageops::resize(image, width, height, FilterType::Triangle);
                composite_over(&mut canvas, &stretched, 0, 0);
            }
        }
    }

    paint_silhouette(&mut canvas, face, config);

    for asset in [face.eyes_sprite(), face.mouth_sprite()] {
        if let Some(sprite) = resident(catalog, asset) {
            paint_centered(&mut canvas, sprite);
        }
    }

    for layer in layers {
        if let Some(sprite) = resident(catalog, layer.asset()) {
            paint_layer(&mut canvas, sprite, layer);
        }
    }

    canvas
}

fn resident<'a>(catalog: &'a AssetCatalog, asset: &AssetRef) -> Option<&'a RgbaImage> {
    let image = catalog.image(asset);
    if image.is_none() {
        debug!("Skipping {} this frame: not resident", asset);
    }
    image
}

fn to_rgba(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

/// The face circle, filled with the fill color and optionally outlined.
fn paint_silhouette(canvas: &mut RgbaImage, face: &FaceState, config: &ComposerConfig) {
    let (width, height) = canvas.dimensions();
    let center = Pos2::new(width as f32 / 2.0, height as f32 / 2.0);
    let radius = width.min(height) as f32 * config.silhouette.radius_ratio;
    if radius <= 0.0 {
        return;
    }

    let fill = to_rgba(face.fill_color());
    let outline = face
        .stroke_color()
        .map(|color| (to_rgba(color), radius - config.silhouette.stroke_width.max(0.0)));

    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil() as u32).min(width);
    let y1 = ((center.y + radius).ceil() as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let distance = pixel_center(x, y).distance(center);
            if distance > radius {
                continue;
            }
            let color = match outline {
                Some((stroke, inner_radius)) if distance > inner_radius => stroke,
                _ => fill,
            };
            blend_pixel(canvas, x, y, color);
        }
    }
}

/// Face parts are authored to line up when centered on the canvas.
fn paint_centered(canvas: &mut RgbaImage, sprite: &RgbaImage) {
    let x = (canvas.width() as i64 - sprite.width() as i64) / 2;
    let y = (canvas.height() as i64 - sprite.height() as i64) / 2;
    composite_over(canvas, sprite, x as i32, y as i32);
}

/// Paints one accessory at its transform.
///
/// Each canvas pixel inside the layer's bounds is mapped back into sprite
/// space and sampled nearest-neighbor.
fn paint_layer(canvas: &mut RgbaImage, sprite: &RgbaImage, layer: &AccessoryLayer) {
    let size = layer.size();
    let transform = layer.transform();
    if sprite.width() == 0
        || sprite.height() == 0
        || size.x <= 0.0
        || size.y <= 0.0
        || !(transform.scale.x > 0.0 && transform.scale.y > 0.0)
    {
        return;
    }

    let (width, height) = canvas.dimensions();
    let bounds = layer.bounding_rect();
    let x0 = bounds.min.x.floor().max(0.0) as u32;
    let y0 = bounds.min.y.floor().max(0.0) as u32;
    let x1 = (bounds.max.x.ceil().max(0.0) as u32).min(width);
    let y1 = (bounds.max.y.ceil().max(0.0) as u32).min(height);

    // Layer size and pixel size may differ if the asset was swapped after placement
    let texels_per_unit = Vec2::new(
        sprite.width() as f32 / size.x,
        sprite.height() as f32 / size.y,
    );

    for y in y0..y1 {
        for x in x0..x1 {
            let local = transform.to_local(pixel_center(x, y)) + size / 2.0;
            let u = local.x * texels_per_unit.x;
            let v = local.y * texels_per_unit.y;
            if !(u >= 0.0 && v >= 0.0 && u < sprite.width() as f32 && v < sprite.height() as f32) {
                continue;
            }
            let texel = *sprite.get_pixel(u as u32, v as u32);
            blend_pixel(canvas, x, y, texel);
        }
    }
}

fn pixel_center(x: u32, y: u32) -> Pos2 {
    Pos2::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn blend_pixel(canvas: &mut RgbaImage, x: u32, y: u32, src: Rgba<u8>) {
    let dst = canvas.get_pixel_mut(x, y);
    *dst = alpha_blend(src, *dst);
}

/// Composites `src` over `dest` with its top-left corner at (x, y), clipping
/// whatever falls outside.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i64;
    let dest_height = dest.height() as i64;

    for sy in 0..src.height() {
        let dy = y as i64 + sy as i64;
        if dy < 0 || dy >= dest_height {
            continue;
        }
        for sx in 0..src.width() {
            let dx = x as i64 + sx as i64;
            if dx < 0 || dx >= dest_width {
                continue;
            }
            blend_pixel(dest, dx as u32, dy as u32, *src.get_pixel(sx, sy));
        }
    }
}

/// Source-over blending of two unpremultiplied RGBA pixels.
pub fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}
