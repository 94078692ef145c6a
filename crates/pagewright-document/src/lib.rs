// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewright-document — Document processing for the Pagewright composition engine.
//
// Provides the page-level document model (open, compose, materialize), a
// render pipeline for image-space page edits (text, watermark, page numbers,
// backgrounds, crop/resize/orientation), content extraction, image↔PDF
// conversion, and the `dispatch` surface callers drive it through.

pub mod convert;
pub mod dispatch;
pub mod extract;
pub mod image;
pub mod output;
pub mod pdf;
pub mod render;
pub mod toc;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export the primary structs so callers can use `pagewright_document::PdfDocument` etc.
pub use dispatch::{Engine, Invocation, Operation, Outcome};
pub use image::processor::ImageProcessor;
pub use output::OutputMaterializer;
pub use pdf::document::{DocumentMetadata, Page, PageAnnotation, PdfDocument};
pub use pdf::writer::PdfWriter;
pub use render::RenderPipeline;
pub use render::rasterizer::{PageRasterizer, PdfiumRasterizer};
