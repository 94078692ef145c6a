// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format conversion between images and PDF.
//
// Images become one PDF page each, laid out on the configured paper. PDFs
// become one PNG per page through the render pipeline. Office formats are
// recognised so they can be refused with a clear message.

use std::path::{Path, PathBuf};

use pagewright_core::DocumentKind;
use pagewright_core::PaperSize;
use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::pdf::document::PdfDocument;
use crate::pdf::writer::PdfWriter;
use crate::render::RenderPipeline;
use crate::render::rasterizer::PageRasterizer;

/// Image/PDF converter.
pub struct DocumentConverter;

impl DocumentConverter {
    /// Classify `path` by extension, refusing anything this engine cannot
    /// read.
    pub fn check_supported(path: &Path) -> Result<DocumentKind> {
        match DocumentKind::from_path(path) {
            Some(DocumentKind::Office) => Err(PagewrightError::UnsupportedDocument(format!(
                "{} is an office document; convert it to PDF first",
                path.display()
            ))),
            Some(kind) => Ok(kind),
            None => Err(PagewrightError::UnsupportedDocument(format!(
                "{} has an unrecognised file type",
                path.display()
            ))),
        }
    }

    /// Lay each image out on its own page of `paper`, in the given order.
    #[instrument(skip_all, fields(images = paths.len(), ?paper))]
    pub fn images_to_pdf(paths: &[PathBuf], paper: PaperSize) -> Result<Vec<u8>> {
        let images = paths
            .iter()
            .map(|path| {
                let kind = Self::check_supported(path)?;
                if !kind.is_image() {
                    return Err(PagewrightError::UnsupportedDocument(format!(
                        "{} is not an image",
                        path.display()
                    )));
                }
                Ok(ImageProcessor::open(path)?.into_dynamic())
            })
            .collect::<Result<Vec<_>>>()?;

        let writer = PdfWriter::new(paper);
        let pdf = writer.create_from_images(&images)?;
        info!(pages = images.len(), bytes = pdf.len(), "Images converted to PDF");
        Ok(pdf)
    }

    /// Render every page to PNG bytes, in page order.
    #[instrument(skip_all, fields(pages = doc.page_count()))]
    pub fn pdf_to_images<R: PageRasterizer>(
        pipeline: &RenderPipeline<R>,
        doc: &PdfDocument,
    ) -> Result<Vec<Vec<u8>>> {
        let pngs = pipeline
            .rasterize_all(doc)?
            .into_iter()
            .map(|image| ImageProcessor::from_dynamic(image).to_png_bytes())
            .collect::<Result<Vec<_>>>()?;
        debug!(images = pngs.len(), "Pages exported as PNG");
        Ok(pngs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FakeRasterizer, sample_document, write_png};
    use pagewright_core::EngineConfig;

    #[test]
    fn office_documents_are_refused() {
        let err = DocumentConverter::check_supported(Path::new("report.docx")).unwrap_err();
        assert!(matches!(err, PagewrightError::UnsupportedDocument(_)));
        assert!(DocumentConverter::check_supported(Path::new("notes.xyz")).is_err());
        assert_eq!(
            DocumentConverter::check_supported(Path::new("scan.JPG")).expect("jpeg"),
            DocumentKind::Jpeg
        );
    }

    #[test]
    fn one_page_per_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = vec![
            write_png(dir.path(), "a.png", 30, 20),
            write_png(dir.path(), "b.png", 10, 40),
        ];
        let pdf = DocumentConverter::images_to_pdf(&paths, PaperSize::A4).expect("convert");
        let doc = PdfDocument::from_bytes(&pdf).expect("reload");
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn no_images_is_an_error() {
        assert!(DocumentConverter::images_to_pdf(&[], PaperSize::A4).is_err());
    }

    #[test]
    fn pdf_is_rendered_page_by_page() {
        let config = EngineConfig {
            render_dpi: 10,
            ..EngineConfig::default()
        };
        let pipeline = RenderPipeline::new(FakeRasterizer::default(), config).expect("pipeline");
        let pngs = DocumentConverter::pdf_to_images(&pipeline, &sample_document(&["a", "b"]))
            .expect("export");
        assert_eq!(pngs.len(), 2);
        let first = ImageProcessor::from_bytes(&pngs[0]).expect("png");
        assert_eq!((first.width(), first.height()), (20, 30));
    }
}
