// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — create new PDF pages from images or text listings using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use ::image::DynamicImage;
use pagewright_core::PaperSize;
use pagewright_core::error::{Result, ValidationError};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument};

const MM_PER_INCH: f32 = 25.4;

/// Title embedded in PDFs built from images.
const IMAGES_TITLE: &str = "Pagewright Images";

/// Creates new PDF documents from raster images or lines of text.
pub struct PdfWriter {
    /// Paper size for page creation.
    paper_size: PaperSize,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self { paper_size }
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    // -- Images to PDF --------------------------------------------------------

    /// Create a PDF with one page per image.
    ///
    /// Each image is scaled to fit within the page margins while preserving
    /// its aspect ratio, and centred. Images are never upscaled.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn create_from_images(&self, images: &[DynamicImage]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(ValidationError::InsufficientInputs {
                required: 1,
                supplied: 0,
            }
            .into());
        }

        let (page_w, page_h) = self.page_dimensions();
        info!(paper = ?self.paper_size, "Creating image PDF");

        let mut doc = PdfDocument::new(IMAGES_TITLE);
        let pages = images
            .iter()
            .map(|image| {
                let xobject_id = doc.add_image(&raw_image(image));
                PdfPage::new(page_w, page_h, fit_on_page(xobject_id, image, page_w, page_h))
            })
            .collect();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }

    /// A single page exactly the size of `image` rendered at `dpi`, with the
    /// image filling it. Used to put rasterized pages back into a document.
    pub fn page_fragment(image: &DynamicImage, dpi: u32) -> Vec<u8> {
        let dpi = dpi.max(1) as f32;
        let page_w = Mm(image.width() as f32 / dpi * MM_PER_INCH);
        let page_h = Mm(image.height() as f32 / dpi * MM_PER_INCH);

        let mut doc = PdfDocument::new("Pagewright Page");
        let xobject_id = doc.add_image(&raw_image(image));
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(dpi),
                rotate: None,
            },
        }];
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        doc.save(&PdfSaveOptions::default(), &mut warnings)
    }

    // -- Text listing ---------------------------------------------------------

    /// Lay out a titled list of single-line entries, top to bottom, breaking
    /// onto new pages as needed. The title uses Helvetica-Bold 16 pt, entries
    /// Helvetica 12 pt at 20 pt leading.
    #[instrument(skip_all, fields(entries = lines.len()))]
    pub fn create_listing(&self, heading: &str, lines: &[String]) -> Vec<u8> {
        const LEFT: f32 = 100.0;
        const TOP: f32 = 750.0;
        const FIRST_ENTRY: f32 = 720.0;
        const LEADING: f32 = 20.0;
        const BOTTOM: f32 = 100.0;

        let (page_w, page_h) = self.page_dimensions();

        let mut pages: Vec<PdfPage> = Vec::new();
        let mut ops = text_line(heading, LEFT, TOP, 16.0, BuiltinFont::HelveticaBold);
        let mut y = FIRST_ENTRY;

        for line in lines {
            if y < BOTTOM {
                pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
                y = TOP;
            }
            ops.extend(text_line(line, LEFT, y, 12.0, BuiltinFont::Helvetica));
            y -= LEADING;
        }
        pages.push(PdfPage::new(page_w, page_h, ops));

        debug!(pages = pages.len(), "Listing layout complete");

        let mut doc = PdfDocument::new(heading);
        doc.with_pages(pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        doc.save(&PdfSaveOptions::default(), &mut warnings)
    }
}

// -- Layout helpers -------------------------------------------------------------

fn raw_image(image: &DynamicImage) -> RawImage {
    let rgb = image.to_rgb8();
    RawImage {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        pixels: RawImageData::U8(rgb.into_raw()),
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    }
}

/// Ops placing an image centred within 15 mm margins at a nominal 150 DPI.
fn fit_on_page(xobject_id: XObjectId, image: &DynamicImage, page_w: Mm, page_h: Mm) -> Vec<Op> {
    let margin_mm: f32 = 15.0;
    let usable_w_pt = Mm(page_w.0 - 2.0 * margin_mm).into_pt().0;
    let usable_h_pt = Mm(page_h.0 - 2.0 * margin_mm).into_pt().0;

    // Image native size at a default DPI of 150 (reasonable for print).
    let dpi: f32 = 150.0;
    let img_w_pt = image.width() as f32 / dpi * 72.0;
    let img_h_pt = image.height() as f32 / dpi * 72.0;

    // Scale to fit while preserving aspect ratio; do not upscale.
    let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);
    let rendered_w_pt = img_w_pt * scale;
    let rendered_h_pt = img_h_pt * scale;

    let margin_pt = Mm(margin_mm).into_pt().0;
    let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
    let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

    debug!(rendered_w_pt, rendered_h_pt, scale, "Image placed on page");

    vec![Op::UseXobject {
        id: xobject_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(x_offset)),
            translate_y: Some(Pt(y_offset)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(dpi),
            rotate: None,
        },
    }]
}

fn text_line(text: &str, x: f32, y: f32, size: f32, font: BuiltinFont) -> Vec<Op> {
    vec![
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font: font.clone(),
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        },
        Op::EndTextSection,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::PdfDocument as Document;
    use ::image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])))
    }

    #[test]
    fn one_page_per_image() {
        let writer = PdfWriter::new(PaperSize::A4);
        let bytes = writer
            .create_from_images(&[solid(300, 200), solid(50, 80)])
            .expect("pdf");
        let doc = Document::from_bytes(&bytes).expect("reload");
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn no_images_is_rejected() {
        assert!(PdfWriter::new(PaperSize::A4).create_from_images(&[]).is_err());
    }

    #[test]
    fn fragment_page_matches_pixel_size() {
        let bytes = PdfWriter::page_fragment(&solid(400, 600), 200);
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        let (_, page_id) = doc.get_pages().into_iter().next().expect("page");
        let media_box = doc
            .get_dictionary(page_id)
            .and_then(|d| d.get(b"MediaBox"))
            .and_then(|m| m.as_array())
            .expect("media box")
            .clone();
        let width = media_box[2].as_float().expect("width");
        let height = media_box[3].as_float().expect("height");
        // 2in x 3in at 72 pt per inch.
        assert!((width - 144.0).abs() < 1.0);
        assert!((height - 216.0).abs() < 1.0);
    }

    #[test]
    fn long_listing_breaks_onto_new_pages() {
        let writer = PdfWriter::new(PaperSize::Letter);
        let lines: Vec<String> = (0..60).map(|i| format!("Entry {i}")).collect();
        let doc = Document::from_bytes(&writer.create_listing("Table of Contents", &lines))
            .expect("reload");
        // 32 entries fit under the title, 33 on each following page.
        assert_eq!(doc.page_count(), 2);
    }
}
