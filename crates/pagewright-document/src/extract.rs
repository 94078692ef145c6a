// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content extraction — plain text and embedded raster images.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Object, Stream};
use pagewright_core::error::Result;
use tracing::{debug, instrument, warn};

use crate::image::ImageProcessor;
use crate::pdf::document::{Page, PdfDocument};

/// An image XObject pulled out of a page.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-based page the image was found on.
    pub page: usize,
    /// 1-based running count across the whole document.
    pub index: usize,
    /// `"jpg"` for passed-through DCT data, `"png"` for re-encoded samples.
    pub extension: &'static str,
    pub data: Vec<u8>,
}

impl ExtractedImage {
    /// File name stem, without the uniqueness suffix.
    pub fn stem(&self) -> String {
        format!("image_{}_{}", self.page, self.index)
    }
}

/// Text of every page, each followed by a blank line.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn extract_text(doc: &PdfDocument) -> String {
    doc.page_texts()
        .into_iter()
        .map(|text| format!("{text}\n\n"))
        .collect()
}

/// Every image XObject referenced from page resources, in page order.
///
/// JPEG streams are returned untouched. Unfiltered or Flate-compressed 8-bit
/// RGB and grey samples are re-encoded as PNG. Anything else (CMYK, indexed
/// palettes, JBIG2, JPX, soft masks) is skipped.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn extract_images(doc: &PdfDocument) -> Result<Vec<ExtractedImage>> {
    let mut found = Vec::new();
    for (index, page) in doc.pages().iter().enumerate() {
        for (name, stream) in image_streams(page) {
            let Some((extension, data)) = decode_image(stream, &name)? else {
                continue;
            };
            found.push(ExtractedImage {
                page: index + 1,
                index: found.len() + 1,
                extension,
                data,
            });
        }
    }
    debug!(images = found.len(), "Images extracted");
    Ok(found)
}

/// `(resource name, stream)` for each image XObject on `page`.
fn image_streams(page: &Page) -> Vec<(String, &Stream)> {
    let source = &page.source;
    let Some(xobjects) = page
        .inherited(b"Resources")
        .and_then(|res| res.as_dict().ok())
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| source.resolve(obj))
        .and_then(|obj| obj.as_dict().ok())
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(name, obj)| {
            let stream = source.resolve(obj)?.as_stream().ok()?;
            let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
            (subtype == b"Image").then(|| (String::from_utf8_lossy(name).into_owned(), stream))
        })
        .collect()
}

fn filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_image(stream: &Stream, name: &str) -> Result<Option<(&'static str, Vec<u8>)>> {
    let filters = filters(stream);
    if matches!(filters.as_slice(), [only] if only == b"DCTDecode") {
        return Ok(Some(("jpg", stream.content.clone())));
    }

    let samples = match filters.as_slice() {
        [] => stream.content.clone(),
        [only] if only.as_slice() == b"FlateDecode" => match stream.decompressed_content() {
            Ok(data) => data,
            Err(err) => {
                warn!(image = name, %err, "Cannot decompress image stream, skipping");
                return Ok(None);
            }
        },
        _ => {
            warn!(image = name, "Unsupported image filter, skipping");
            return Ok(None);
        }
    };

    let dict = &stream.dict;
    let width = dict.get(b"Width").and_then(Object::as_i64).unwrap_or(0);
    let height = dict.get(b"Height").and_then(Object::as_i64).unwrap_or(0);
    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(0);
    let colour_space = dict
        .get(b"ColorSpace")
        .and_then(Object::as_name)
        .unwrap_or_default();

    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        warn!(image = name, "Image has invalid dimensions, skipping");
        return Ok(None);
    };
    if bits != 8 || width == 0 || height == 0 {
        warn!(image = name, bits, "Unsupported image layout, skipping");
        return Ok(None);
    }

    let image = match colour_space {
        b"DeviceRGB" => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        b"DeviceGray" => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        other => {
            warn!(
                image = name,
                colour_space = %String::from_utf8_lossy(other),
                "Unsupported colour space, skipping"
            );
            return Ok(None);
        }
    };
    let Some(image) = image else {
        warn!(image = name, "Image data is shorter than its dimensions, skipping");
        return Ok(None);
    };

    Ok(Some(("png", ImageProcessor::from_dynamic(image).to_png_bytes()?)))
}
