// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-space page decorations. Every function takes a rasterized page and
// returns a new image; none of them touch PDF structures.

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size as measure};
use pagewright_core::{PageAnchor, Rgb as Colour};

/// Distance of page numbers from the top or bottom edge, in pixels.
pub const PAGE_NUMBER_MARGIN_Y: i32 = 30;
/// Distance of corner-anchored page numbers from the side edge, in pixels.
pub const PAGE_NUMBER_MARGIN_X: i32 = 50;

/// Width and height of `text` at `size` pixels.
pub fn text_size(font: &FontArc, size: f32, text: &str) -> (u32, u32) {
    measure(PxScale::from(size), font, text)
}

/// Draw `text` with its top-left corner at `(x, y)`.
pub fn draw_text(
    page: &DynamicImage,
    text: &str,
    (x, y): (i32, i32),
    size: f32,
    colour: Colour,
    font: &FontArc,
) -> DynamicImage {
    let mut canvas = page.to_rgba8();
    let Colour(r, g, b) = colour;
    draw_text_mut(&mut canvas, Rgba([r, g, b, 255]), x, y, PxScale::from(size), font, text);
    DynamicImage::ImageRgba8(canvas)
}

/// Paste `overlay`, resized to `(width, height)`, at `(x, y)`. Transparent
/// parts of the overlay let the page show through.
pub fn overlay_image(
    page: &DynamicImage,
    overlay: &DynamicImage,
    (x, y): (i64, i64),
    (width, height): (u32, u32),
) -> DynamicImage {
    let mut canvas = page.to_rgba8();
    let resized = overlay.resize_exact(width, height, FilterType::Lanczos3).to_rgba8();
    imageops::overlay(&mut canvas, &resized, x, y);
    DynamicImage::ImageRgba8(canvas)
}

/// Centre `text` on the page in black at the given opacity (0.0 to 1.0).
pub fn watermark(
    page: &DynamicImage,
    text: &str,
    size: f32,
    opacity: f32,
    font: &FontArc,
) -> DynamicImage {
    let mut canvas = page.to_rgba8();
    let (width, height) = canvas.dimensions();
    let (text_w, text_h) = text_size(font, size, text);

    let mut layer = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));
    let alpha = (255.0 * opacity.clamp(0.0, 1.0)).round() as u8;
    let x = (width as i32 - text_w as i32) / 2;
    let y = (height as i32 - text_h as i32) / 2;
    draw_text_mut(&mut layer, Rgba([0, 0, 0, alpha]), x, y, PxScale::from(size), font, text);

    imageops::overlay(&mut canvas, &layer, 0, 0);
    DynamicImage::ImageRgba8(canvas)
}

/// Put `background` (stretched to the page) behind the page content.
///
/// The page's own luminance is the blend mask: white areas show the
/// background, dark areas (text, lines) keep the page.
pub fn blend_background(page: &DynamicImage, background: &DynamicImage) -> DynamicImage {
    let (width, height) = (page.width(), page.height());
    let backdrop = background.resize_exact(width, height, FilterType::Lanczos3).to_rgb8();
    let content = page.to_rgb8();
    let mask = page.to_luma8();

    let blended = RgbImage::from_fn(width, height, |x, y| {
        let keep = (255 - mask.get_pixel(x, y).0[0]) as f32 / 255.0;
        let Rgb(fg) = *content.get_pixel(x, y);
        let Rgb(bg) = *backdrop.get_pixel(x, y);
        let mix = |i: usize| (bg[i] as f32 * (1.0 - keep) + fg[i] as f32 * keep).round() as u8;
        Rgb([mix(0), mix(1), mix(2)])
    });
    DynamicImage::ImageRgb8(blended)
}

/// Top-left corner for text of `text_w` x `text_h` anchored on a
/// `width` x `height` page.
pub fn anchor_origin(
    anchor: PageAnchor,
    width: u32,
    height: u32,
    text_w: u32,
    text_h: u32,
) -> (i32, i32) {
    let (width, height) = (width as i32, height as i32);
    let (text_w, text_h) = (text_w as i32, text_h as i32);

    let y = if anchor.is_top() {
        PAGE_NUMBER_MARGIN_Y
    } else {
        height - PAGE_NUMBER_MARGIN_Y - text_h
    };
    let x = match anchor {
        PageAnchor::TopCenter | PageAnchor::BottomCenter => (width - text_w) / 2,
        PageAnchor::TopLeft | PageAnchor::BottomLeft => PAGE_NUMBER_MARGIN_X,
        PageAnchor::TopRight | PageAnchor::BottomRight => width - PAGE_NUMBER_MARGIN_X - text_w,
    };
    (x, y)
}

/// Stamp `number` at `anchor` in black.
pub fn page_number(
    page: &DynamicImage,
    number: usize,
    anchor: PageAnchor,
    size: f32,
    font: &FontArc,
) -> DynamicImage {
    let label = number.to_string();
    let (text_w, text_h) = text_size(font, size, &label);
    let origin = anchor_origin(anchor, page.width(), page.height(), text_w, text_h);
    draw_text(page, &label, origin, size, Colour::BLACK, font)
}
