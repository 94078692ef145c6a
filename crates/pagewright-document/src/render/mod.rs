// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render pipeline — page edits that have to happen in image space.
//
// Targeted pages are rasterized, edited as images, wrapped back into
// single-page PDFs sized to the raster, and spliced into the document at the
// same index. Untouched pages keep their original PDF content.

pub mod annotate;
pub mod fonts;
pub mod rasterizer;

use std::collections::BTreeSet;

use ab_glyph::FontArc;
use image::DynamicImage;
use pagewright_core::error::{PagewrightError, Result, ValidationError};
use pagewright_core::{CropBox, EngineConfig, PageAnchor, Rgb};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::pdf::compose;
use crate::pdf::document::PdfDocument;
use crate::pdf::writer::PdfWriter;
use rasterizer::PageRasterizer;

/// Rasterize-edit-reassemble pipeline over a [`PageRasterizer`].
pub struct RenderPipeline<R: PageRasterizer> {
    rasterizer: R,
    font: FontArc,
    config: EngineConfig,
}

impl<R: PageRasterizer> RenderPipeline<R> {
    /// Build a pipeline, loading the configured font (or the embedded one).
    pub fn new(rasterizer: R, config: EngineConfig) -> Result<Self> {
        let font = fonts::load_font(config.preferred_font.as_deref())?;
        Ok(Self {
            rasterizer,
            font,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Rasterize every page at the configured DPI, in page order.
    #[instrument(skip_all, fields(pages = doc.page_count(), dpi = self.config.render_dpi))]
    pub fn rasterize_all(&self, doc: &PdfDocument) -> Result<Vec<DynamicImage>> {
        let bytes = doc.to_bytes()?;
        let images = self.rasterizer.rasterize(&bytes, self.config.render_dpi)?;
        check_image_count(images.len(), doc.page_count())?;
        Ok(images)
    }

    // -- Decorations ----------------------------------------------------------

    /// Draw `text` on one page (0-based) with its top-left corner at `position`
    /// in raster pixels.
    #[instrument(skip(self, doc, text), fields(page))]
    pub fn add_text(
        &self,
        doc: &PdfDocument,
        page: usize,
        text: &str,
        position: (i32, i32),
        size: Option<f32>,
        colour: Rgb,
    ) -> Result<PdfDocument> {
        let size = size.unwrap_or(self.config.text_font_size);
        self.transform_pages(doc, &[page], |_, image| {
            Ok(annotate::draw_text(&image, text, position, size, colour, &self.font))
        })
    }

    /// Paste `overlay`, resized to `size` pixels, onto one page at `position`.
    #[instrument(skip(self, doc, overlay), fields(page))]
    pub fn add_image(
        &self,
        doc: &PdfDocument,
        page: usize,
        overlay: &DynamicImage,
        position: (i64, i64),
        size: (u32, u32),
    ) -> Result<PdfDocument> {
        if size.0 == 0 || size.1 == 0 {
            return Err(ValidationError::InvalidSize {
                width: size.0,
                height: size.1,
            }
            .into());
        }
        self.transform_pages(doc, &[page], |_, image| {
            Ok(annotate::overlay_image(&image, overlay, position, size))
        })
    }

    /// Centre `text` on every page.
    #[instrument(skip(self, doc, text))]
    pub fn watermark(
        &self,
        doc: &PdfDocument,
        text: &str,
        opacity: Option<f32>,
    ) -> Result<PdfDocument> {
        let opacity = opacity.unwrap_or(self.config.watermark_opacity);
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ValidationError::InvalidOpacity(opacity).into());
        }
        let size = self.config.watermark_font_size;
        self.transform_all(doc, |_, image| {
            Ok(annotate::watermark(&image, text, size, opacity, &self.font))
        })
    }

    /// Number every page (1-based) at `anchor`.
    #[instrument(skip(self, doc))]
    pub fn page_numbers(&self, doc: &PdfDocument, anchor: PageAnchor) -> Result<PdfDocument> {
        let size = self.config.page_number_font_size;
        self.transform_all(doc, |index, image| {
            Ok(annotate::page_number(&image, index + 1, anchor, size, &self.font))
        })
    }

    /// Put `background` behind the content of every page.
    #[instrument(skip_all)]
    pub fn background(&self, doc: &PdfDocument, background: &DynamicImage) -> Result<PdfDocument> {
        self.transform_all(doc, |_, image| Ok(annotate::blend_background(&image, background)))
    }

    // -- Geometry -------------------------------------------------------------

    /// Crop every page to `area` (raster pixels).
    #[instrument(skip(self, doc))]
    pub fn crop(&self, doc: &PdfDocument, area: CropBox) -> Result<PdfDocument> {
        self.transform_all(doc, |_, image| {
            Ok(ImageProcessor::from_dynamic(image).crop(area)?.into_dynamic())
        })
    }

    /// Resize every page to exactly `width` x `height` raster pixels.
    #[instrument(skip(self, doc))]
    pub fn resize(&self, doc: &PdfDocument, width: u32, height: u32) -> Result<PdfDocument> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidSize { width, height }.into());
        }
        self.transform_all(doc, |_, image| {
            Ok(ImageProcessor::from_dynamic(image)
                .resize_exact(width, height)?
                .into_dynamic())
        })
    }

    /// Turn every page a quarter turn counter-clockwise.
    #[instrument(skip_all)]
    pub fn change_orientation(&self, doc: &PdfDocument) -> Result<PdfDocument> {
        self.transform_all(doc, |_, image| {
            Ok(ImageProcessor::from_dynamic(image)
                .rotate_counter_clockwise()
                .into_dynamic())
        })
    }

    // -- Core transform -------------------------------------------------------

    fn transform_all<F>(&self, doc: &PdfDocument, edit: F) -> Result<PdfDocument>
    where
        F: Fn(usize, DynamicImage) -> Result<DynamicImage> + Sync,
    {
        let targets: Vec<usize> = (0..doc.page_count()).collect();
        self.transform_pages(doc, &targets, edit)
    }

    /// Rasterize the pages at `targets` (0-based), run `edit` on each image and
    /// put the results back in place. `edit` receives the page index.
    fn transform_pages<F>(&self, doc: &PdfDocument, targets: &[usize], edit: F) -> Result<PdfDocument>
    where
        F: Fn(usize, DynamicImage) -> Result<DynamicImage> + Sync,
    {
        let total = doc.page_count();
        if total == 0 {
            return Err(PagewrightError::EmptyResult("document has no pages".into()));
        }
        let targets: Vec<usize> = targets.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if let Some(&bad) = targets.iter().find(|&&index| index >= total) {
            return Err(ValidationError::PageOutOfRange {
                page: bad as u64 + 1,
                total: total as u32,
            }
            .into());
        }

        info!(targets = targets.len(), total, "Rasterizing pages");
        // Pending notes and links stay native annotations; keep them out of
        // the raster so they are not burned into the page.
        let subset = compose::select(doc, &targets)?;
        let subset = subset.with_pages(
            subset
                .pages()
                .iter()
                .map(|page| page.with_annotations(Vec::new()))
                .collect(),
        );
        let images = self
            .rasterizer
            .rasterize(&subset.to_bytes()?, self.config.render_dpi)?;
        check_image_count(images.len(), targets.len())?;

        let dpi = self.config.render_dpi;
        let fragments = targets
            .par_iter()
            .copied()
            .zip(images.into_par_iter())
            .map(|(index, image)| {
                let edited = edit(index, image)?;
                Ok(PdfWriter::page_fragment(&edited, dpi))
            })
            .collect::<Result<Vec<Vec<u8>>>>()?;

        let mut pages = doc.pages().to_vec();
        for (&index, fragment) in targets.iter().zip(&fragments) {
            let rendered = PdfDocument::from_bytes(fragment)?;
            let page = rendered.pages().first().cloned().ok_or_else(|| {
                PagewrightError::Render(format!("rendered fragment for page {} is empty", index + 1))
            })?;
            pages[index] = page.with_annotations(doc.pages()[index].annotations().to_vec());
        }

        debug!(replaced = fragments.len(), "Rendered pages spliced back");
        Ok(doc.with_pages(pages))
    }
}

fn check_image_count(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(PagewrightError::Render(format!(
            "rasterizer returned {got} images for {expected} pages"
        )));
    }
    Ok(())
}
