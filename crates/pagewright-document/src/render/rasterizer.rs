// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — PDF bytes in, one image per page out.
//
// The production implementation binds PDFium at call time. PDFium is not
// thread-safe, so a fresh binding is created per call and pages are rendered
// sequentially.

use std::path::PathBuf;

use image::DynamicImage;
use pagewright_core::error::{PagewrightError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, instrument};

/// Renders every page of a PDF to an image.
pub trait PageRasterizer: Send + Sync {
    /// Rasterize all pages of `pdf` at `dpi`, in page order.
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>>;
}

/// PDFium-backed rasterizer.
///
/// The library is looked up next to the working directory first, then in
/// `library_dir` when configured, then system-wide.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|local_err| match &self.library_dir {
                Some(dir) => {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                }
                None => Err(local_err),
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| PagewrightError::Render(format!("failed to initialise PDFium: {err}")))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    #[instrument(skip_all, fields(bytes_len = pdf.len(), dpi))]
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| PagewrightError::Render(format!("PDFium cannot open document: {err}")))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / 72.0)
            .render_form_data(true)
            .render_annotations(true);

        let mut images = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page.render_with_config(&config).map_err(|err| {
                PagewrightError::Render(format!("failed to render page {}: {err}", index + 1))
            })?;
            images.push(bitmap.as_image());
        }

        debug!(pages = images.len(), "Pages rasterized");
        Ok(images)
    }
}
